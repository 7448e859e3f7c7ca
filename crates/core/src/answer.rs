//! Question-answering result types.
//!
//! These only live for the duration of one question; nothing here is persisted.

use crate::{ConceptNode, DocumentChunk, Result};
use serde::{Deserialize, Serialize};

/// Answer returned when anything in the pipeline fails
pub const FAILURE_ANSWER: &str = "Sorry, I couldn't process your question.";

/// Number of leading characters used to detect duplicate passages
pub const FINGERPRINT_CHARS: usize = 100;

/// A concept considered for an answer, with its ranking signals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub node: ConceptNode,

    /// Only present when the concept was reached through a relation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_strength: Option<f32>,

    #[serde(default)]
    pub relevance_score: f32,
}

impl RankedCandidate {
    /// A concept found by direct keyword match
    pub fn matched(node: ConceptNode) -> Self {
        Self {
            node,
            relation_strength: None,
            relevance_score: 0.0,
        }
    }

    /// A concept found by following a relation of the given strength
    pub fn expanded(node: ConceptNode, relation_strength: f32) -> Self {
        Self {
            node,
            relation_strength: Some(relation_strength),
            relevance_score: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }
}

/// A supporting text passage tied to the concept that surfaced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextPassage {
    pub text: String,
    pub source: String,
    pub chunk_index: u32,
    pub related_concept: String,
}

impl ContextPassage {
    pub fn from_chunk(chunk: DocumentChunk, related_concept: impl Into<String>) -> Self {
        Self {
            text: chunk.text,
            source: chunk.source,
            chunk_index: chunk.chunk_index,
            related_concept: related_concept.into(),
        }
    }

    /// Dedup key: the first `FINGERPRINT_CHARS` characters of the text.
    ///
    /// Distinct passages sharing that prefix collapse into one.
    pub fn fingerprint(&self) -> &str {
        match self.text.char_indices().nth(FINGERPRINT_CHARS) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }
}

/// The answer to one question together with its provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResult {
    pub answer: String,

    /// Ranked concepts, at most 15
    pub relevant_nodes: Vec<RankedCandidate>,

    /// The first (at most 3) assembled passages
    pub context_sources: Vec<ContextPassage>,

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Names of the top (at most 10) relevant concepts
    pub graph_highlights: Vec<String>,
}

impl AnswerResult {
    /// The fixed result returned when the pipeline fails outright
    pub fn failure() -> Self {
        Self {
            answer: FAILURE_ANSWER.to_string(),
            relevant_nodes: Vec::new(),
            context_sources: Vec::new(),
            confidence: 0.0,
            graph_highlights: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        *self == Self::failure()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
