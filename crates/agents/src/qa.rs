//! QA Engine - answers questions from the concept graph

use crate::confidence::score_confidence;
use crate::context::ContextAssembler;
use crate::keywords::extract_keywords;
use crate::ranker::RelevanceRanker;
use crate::suggestions::QuestionSuggester;
use crate::synthesizer::{
    synthesis_error_answer, AnswerSynthesizer, SynthesisRequest, INSUFFICIENT_CONTEXT_ANSWER,
};
use crate::{GraphQueryAdapter, Result};
use conceptgraph_core::AnswerResult;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const CONTEXT_SOURCES: usize = 3;
const GRAPH_HIGHLIGHTS: usize = 10;

/// Runs the retrieval pipeline and hands the result to a synthesizer
pub struct QaEngine {
    ranker: RelevanceRanker,
    assembler: ContextAssembler,
    suggester: QuestionSuggester,
    synthesizer: Arc<dyn AnswerSynthesizer>,
}

impl QaEngine {
    pub fn new(graph: Arc<dyn GraphQueryAdapter>, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        Self {
            ranker: RelevanceRanker::new(graph.clone()),
            assembler: ContextAssembler::new(graph.clone()),
            suggester: QuestionSuggester::new(graph),
            synthesizer,
        }
    }

    /// Answer a question. Never fails: any retrieval error yields
    /// [`AnswerResult::failure`].
    pub async fn answer_question(&self, question: &str) -> AnswerResult {
        match self.try_answer(question).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to answer question: {}", e);
                AnswerResult::failure()
            }
        }
    }

    /// The pipeline with retrieval errors surfaced. Synthesis errors are
    /// folded into the answer text instead.
    #[instrument(skip(self))]
    pub async fn try_answer(&self, question: &str) -> Result<AnswerResult> {
        let keywords = extract_keywords(question);
        debug!("Keywords: {:?}", keywords);

        let nodes = self.ranker.rank(&keywords).await?;
        let passages = self.assembler.assemble(&nodes).await?;
        info!("Found {} concepts and {} passages", nodes.len(), passages.len());

        let answer = if passages.is_empty() {
            INSUFFICIENT_CONTEXT_ANSWER.to_string()
        } else {
            let request = SynthesisRequest::new(question, &passages, &nodes);
            match self.synthesizer.synthesize(&request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Answer synthesis failed: {}", e);
                    synthesis_error_answer(&e.to_string())
                }
            }
        };

        let confidence = score_confidence(&keywords, &nodes, &passages);
        let graph_highlights = nodes
            .iter()
            .take(GRAPH_HIGHLIGHTS)
            .map(|c| c.name().to_string())
            .collect();
        let context_sources = passages.into_iter().take(CONTEXT_SOURCES).collect();

        Ok(AnswerResult {
            answer,
            relevant_nodes: nodes,
            context_sources,
            confidence,
            graph_highlights,
        })
    }

    /// Candidate follow-up questions based on the most important concepts
    pub async fn suggest_questions(&self) -> Result<Vec<String>> {
        self.suggester.suggest().await
    }
}
