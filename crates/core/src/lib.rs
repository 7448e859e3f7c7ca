//! Core domain types for the concept graph
//!
//! This crate defines the data model shared by storage and question
//! answering: concepts, relations, document chunks, and the ephemeral
//! ranking and answer types.

pub mod answer;
pub mod chunk;
pub mod concept;
pub mod edge;
pub mod error;
pub mod graph;

pub use answer::{AnswerResult, ContextPassage, RankedCandidate, FAILURE_ANSWER};
pub use chunk::{clean_text, DocumentChunk, TextChunker};
pub use concept::{ConceptNode, ConceptType};
pub use edge::RelationEdge;
pub use error::{CoreError, Result};
pub use graph::{GraphSnapshot, GraphStats, Neighbor};
