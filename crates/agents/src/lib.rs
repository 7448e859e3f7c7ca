//! Question answering over the concept graph
//!
//! This crate contains the pipeline stages and their collaborators:
//! - Keywords: turns a question into search terms
//! - Ranker: finds and scores relevant concepts
//! - Context: gathers supporting passages
//! - QA Engine: ties the stages together and calls the synthesizer
//! - Graph Builder: ingests chunks through a concept extractor
//! - Inference: the TGI / Ollama client backing extraction and synthesis

pub mod adapter;
pub mod builder;
pub mod confidence;
pub mod context;
pub mod error;
pub mod inference;
pub mod keywords;
pub mod qa;
pub mod ranker;
pub mod suggestions;
pub mod synthesizer;

pub use adapter::GraphQueryAdapter;
pub use builder::{
    BuildReport, ConceptExtraction, ConceptExtractor, ExtractedConcept, ExtractedRelationship,
    GraphBuilder, ProgressObserver,
};
pub use confidence::score_confidence;
pub use context::ContextAssembler;
pub use error::{AgentError, Result};
pub use inference::{LlmClient, LlmProvider};
pub use keywords::extract_keywords;
pub use qa::QaEngine;
pub use ranker::RelevanceRanker;
pub use suggestions::QuestionSuggester;
pub use synthesizer::{AnswerSynthesizer, SynthesisRequest};
