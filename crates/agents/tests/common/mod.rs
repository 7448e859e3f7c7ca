//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use conceptgraph_agents::{
    AgentError, AnswerSynthesizer, ConceptExtraction, ConceptExtractor, ExtractedConcept,
    ExtractedRelationship, GraphBuilder, GraphQueryAdapter, Result, SynthesisRequest,
};
use conceptgraph_core::{ConceptNode, DocumentChunk, Neighbor};
use conceptgraph_db::{init_memory, Repository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Create a test repository with in-memory database
pub async fn create_test_repo() -> Repository {
    let db = init_memory().await.expect("Failed to create test database");
    Repository::new(db)
}

/// Extractor returning canned extractions keyed by chunk id; unknown ids fail
#[derive(Default)]
pub struct ScriptedExtractor {
    results: HashMap<String, ConceptExtraction>,
}

impl ScriptedExtractor {
    pub fn with(mut self, chunk_id: &str, extraction: ConceptExtraction) -> Self {
        self.results.insert(chunk_id.to_string(), extraction);
        self
    }
}

#[async_trait]
impl ConceptExtractor for ScriptedExtractor {
    async fn extract(&self, chunk: &DocumentChunk) -> Result<ConceptExtraction> {
        self.results
            .get(&chunk.id)
            .cloned()
            .ok_or_else(|| AgentError::Llm(format!("no script for {}", chunk.id)))
    }
}

/// Synthesizer that records every request and replies with a fixed text or error
pub struct RecordingSynthesizer {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl RecordingSynthesizer {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(AgentError::Llm)
    }
}

/// Wraps a repository but fails every passage lookup
pub struct BrokenMentions {
    pub inner: Repository,
}

#[async_trait]
impl GraphQueryAdapter for BrokenMentions {
    async fn match_by_keyword(&self, keyword: &str, limit: usize) -> Result<Vec<ConceptNode>> {
        GraphQueryAdapter::match_by_keyword(&self.inner, keyword, limit).await
    }

    async fn expand_neighbors(&self, name: &str, limit: usize) -> Result<Vec<Neighbor>> {
        GraphQueryAdapter::expand_neighbors(&self.inner, name, limit).await
    }

    async fn mentions_of(&self, _name: &str, _limit: usize) -> Result<Vec<DocumentChunk>> {
        Err(AgentError::Processing("passage store offline".into()))
    }

    async fn top_concepts_by_importance(&self, limit: usize) -> Result<Vec<ConceptNode>> {
        GraphQueryAdapter::top_concepts_by_importance(&self.inner, limit).await
    }
}

/// Wraps a repository but fails every neighbor expansion
pub struct BrokenNeighbors {
    pub inner: Repository,
}

#[async_trait]
impl GraphQueryAdapter for BrokenNeighbors {
    async fn match_by_keyword(&self, keyword: &str, limit: usize) -> Result<Vec<ConceptNode>> {
        GraphQueryAdapter::match_by_keyword(&self.inner, keyword, limit).await
    }

    async fn expand_neighbors(&self, _name: &str, _limit: usize) -> Result<Vec<Neighbor>> {
        Err(AgentError::Processing("relation index offline".into()))
    }

    async fn mentions_of(&self, name: &str, limit: usize) -> Result<Vec<DocumentChunk>> {
        GraphQueryAdapter::mentions_of(&self.inner, name, limit).await
    }

    async fn top_concepts_by_importance(&self, limit: usize) -> Result<Vec<ConceptNode>> {
        GraphQueryAdapter::top_concepts_by_importance(&self.inner, limit).await
    }
}

pub fn concept(name: &str, concept_type: &str, importance: f32) -> ExtractedConcept {
    ExtractedConcept::new(name)
        .with_type(concept_type)
        .with_importance(importance)
}

pub fn relation(source: &str, target: &str, strength: f32) -> ExtractedRelationship {
    ExtractedRelationship::new(source, target).with_strength(strength)
}

/// A repository holding one chunk about neural networks, which relate to deep learning
pub async fn neural_network_graph() -> Repository {
    let repo = create_test_repo().await;
    let chunk = DocumentChunk::new(
        "ml_chunk_0",
        "Neural networks are layered function approximators. Deep learning stacks many of them.",
        "ml.txt",
        0,
    );
    let extractor = ScriptedExtractor::default().with(
        "ml_chunk_0",
        ConceptExtraction {
            concepts: vec![
                concept("neural networks", "concept", 0.9),
                concept("deep learning", "topic", 0.7),
            ],
            relationships: vec![relation("neural networks", "deep learning", 0.8)],
        },
    );

    GraphBuilder::new(repo.clone(), Arc::new(extractor))
        .build(&[chunk], &mut ())
        .await
        .expect("Failed to build graph");
    repo
}
