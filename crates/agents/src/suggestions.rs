//! Follow-up question suggestions from the most important concepts

use crate::{GraphQueryAdapter, Result};
use std::sync::Arc;
use tracing::instrument;

const TOP_CONCEPTS: usize = 5;
const TEMPLATED_CONCEPTS: usize = 3;
const MAX_SUGGESTIONS: usize = 8;

const GENERIC_QUESTIONS: [&str; 3] = [
    "What are the main topics in this document?",
    "What relationships exist between concepts?",
    "Summarize the key information",
];

pub struct QuestionSuggester {
    graph: Arc<dyn GraphQueryAdapter>,
}

impl QuestionSuggester {
    pub fn new(graph: Arc<dyn GraphQueryAdapter>) -> Self {
        Self { graph }
    }

    #[instrument(skip(self))]
    pub async fn suggest(&self) -> Result<Vec<String>> {
        let top = self.graph.top_concepts_by_importance(TOP_CONCEPTS).await?;
        let names: Vec<&str> = top.iter().map(|c| c.name.as_str()).collect();
        Ok(suggestions_for(&names))
    }
}

/// Three templated questions for each of the first three names, then the generic ones
pub fn suggestions_for(names: &[&str]) -> Vec<String> {
    let mut suggestions: Vec<String> = names
        .iter()
        .take(TEMPLATED_CONCEPTS)
        .flat_map(|name| {
            [
                format!("What is {}?", name),
                format!("How does {} relate to other concepts?", name),
                format!("Tell me more about {}", name),
            ]
        })
        .collect();

    suggestions.extend(GENERIC_QUESTIONS.iter().map(|q| q.to_string()));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubGraph;
    use conceptgraph_core::{ConceptNode, ConceptType};

    #[test]
    fn test_empty_graph_gets_generic_questions() {
        let suggestions = suggestions_for(&[]);
        assert_eq!(suggestions, GENERIC_QUESTIONS.to_vec());
    }

    #[test]
    fn test_one_concept() {
        let suggestions = suggestions_for(&["Rust"]);
        assert_eq!(suggestions.len(), 6);
        assert_eq!(suggestions[0], "What is Rust?");
        assert_eq!(suggestions[1], "How does Rust relate to other concepts?");
        assert_eq!(suggestions[2], "Tell me more about Rust");
        assert_eq!(suggestions[3], GENERIC_QUESTIONS[0]);
    }

    #[test]
    fn test_truncated_to_eight() {
        let suggestions = suggestions_for(&["a", "b", "c", "d", "e"]);
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[6], "What is c?");
        assert_eq!(suggestions[7], "How does c relate to other concepts?");
        assert!(!suggestions.contains(&"What is d?".to_string()));
    }

    #[tokio::test]
    async fn test_uses_most_important_concepts() {
        let graph = StubGraph::default()
            .with_concept(ConceptNode::new("minor", ConceptType::Topic).with_importance(0.1))
            .with_concept(ConceptNode::new("major", ConceptType::Topic).with_importance(0.9));

        let suggester = QuestionSuggester::new(Arc::new(graph));
        let suggestions = suggester.suggest().await.unwrap();

        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[0], "What is major?");
        assert_eq!(suggestions[3], "What is minor?");
    }
}
