//! Answer synthesis contract and prompt construction

use crate::Result;
use async_trait::async_trait;
use conceptgraph_core::{ContextPassage, RankedCandidate};

/// Answer used when retrieval produced no passages
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I don't have enough information to answer this question.";

pub const SYSTEM_PROMPT: &str = "You are a knowledgeable assistant that answers questions based on provided context. Be accurate and cite sources.";

pub const SYNTHESIS_TEMPERATURE: f32 = 0.3;
pub const SYNTHESIS_MAX_TOKENS: u32 = 500;

/// Characters of each passage included in the prompt
pub const PASSAGE_PROMPT_CHARS: usize = 500;
/// Concept names listed in the prompt
pub const PROMPT_CONCEPTS: usize = 10;

/// Everything a synthesizer needs to answer one question
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub question: String,
    pub passages: Vec<ContextPassage>,
    /// Names of the top ranked concepts
    pub concepts: Vec<String>,
}

impl SynthesisRequest {
    pub fn new(question: &str, passages: &[ContextPassage], nodes: &[RankedCandidate]) -> Self {
        Self {
            question: question.to_string(),
            passages: passages.to_vec(),
            concepts: nodes
                .iter()
                .take(PROMPT_CONCEPTS)
                .map(|c| c.name().to_string())
                .collect(),
        }
    }

    /// The user prompt sent to the language model
    pub fn prompt(&self) -> String {
        let context = self
            .passages
            .iter()
            .map(|p| {
                format!(
                    "Source: {} (chunk {})\nRelated to: {}\nText: {}...",
                    p.source,
                    p.chunk_index,
                    p.related_concept,
                    truncate_chars(&p.text, PASSAGE_PROMPT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Based on the following context from documents and the identified concepts, \
             answer the user's question. Be specific and cite the sources when possible.\n\n\
             Question: {}\n\n\
             Relevant Concepts: {}\n\n\
             Context:\n{}\n\n\
             Provide a clear, informative answer. If the context doesn't fully address \
             the question, mention what information is available and what might be missing.",
            self.question,
            self.concepts.join(", "),
            context
        )
    }
}

/// Produces answer text from a question and its supporting context
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String>;
}

/// Answer text reported when the synthesizer fails
pub fn synthesis_error_answer(reason: &str) -> String {
    format!("Error generating answer: {}", reason)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
