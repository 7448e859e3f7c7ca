//! Graph Builder - turns document chunks into concepts, mentions and relations

use crate::Result;
use async_trait::async_trait;
use conceptgraph_core::concept::DEFAULT_IMPORTANCE;
use conceptgraph_core::edge::{DEFAULT_RELATION_TYPE, DEFAULT_STRENGTH};
use conceptgraph_core::{ConceptNode, ConceptType, DocumentChunk, RelationEdge};
use conceptgraph_db::Repository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Concepts and relations found in one chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConceptExtraction {
    #[serde(default)]
    pub concepts: Vec<ExtractedConcept>,
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

impl ConceptExtraction {
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.relationships.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedConcept {
    pub name: String,
    #[serde(default, alias = "type")]
    pub concept_type: Option<String>,
    #[serde(default)]
    pub importance: Option<f32>,
}

impl ExtractedConcept {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concept_type: None,
            importance: None,
        }
    }

    pub fn with_type(mut self, concept_type: impl Into<String>) -> Self {
        self.concept_type = Some(concept_type.into());
        self
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Normalise into a storable concept. Blank names are dropped.
    pub fn to_node(&self) -> Option<ConceptNode> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let concept_type = self
            .concept_type
            .as_deref()
            .map(ConceptType::from_label)
            .unwrap_or(ConceptType::Concept);

        Some(
            ConceptNode::new(name, concept_type)
                .with_importance(self.importance.unwrap_or(DEFAULT_IMPORTANCE)),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedRelationship {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "type")]
    pub relation_type: Option<String>,
    #[serde(default)]
    pub strength: Option<f32>,
}

impl ExtractedRelationship {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: None,
            strength: None,
        }
    }

    pub fn with_type(mut self, relation_type: impl Into<String>) -> Self {
        self.relation_type = Some(relation_type.into());
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn to_edge(&self) -> RelationEdge {
        let relation_type = self
            .relation_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_RELATION_TYPE);

        RelationEdge::new(self.source.trim(), self.target.trim())
            .with_type(relation_type)
            .with_strength(self.strength.unwrap_or(DEFAULT_STRENGTH))
    }
}

/// Finds concepts and relations in a chunk of text
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    async fn extract(&self, chunk: &DocumentChunk) -> Result<ConceptExtraction>;
}

/// Receives progress while a graph is being built. All methods default to no-ops.
pub trait ProgressObserver {
    fn on_chunk_started(&mut self, _index: usize, _total: usize) {}

    fn on_chunk_finished(&mut self, _index: usize, _total: usize) {}

    fn on_complete(&mut self, _report: &BuildReport) {}
}

impl ProgressObserver for () {}

/// Totals for one build run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub chunks_processed: usize,
    pub concepts_upserted: usize,
    pub relations_created: usize,
    pub extraction_failures: usize,
}

/// Writes extracted knowledge into the graph store
pub struct GraphBuilder {
    repo: Repository,
    extractor: Arc<dyn ConceptExtractor>,
}

impl GraphBuilder {
    pub fn new(repo: Repository, extractor: Arc<dyn ConceptExtractor>) -> Self {
        Self { repo, extractor }
    }

    /// Process `chunks` in order. A failed extraction only loses that chunk's
    /// concepts; storage errors abort the build.
    #[instrument(skip(self, chunks, observer), fields(chunks = chunks.len()))]
    pub async fn build(
        &self,
        chunks: &[DocumentChunk],
        observer: &mut dyn ProgressObserver,
    ) -> Result<BuildReport> {
        let total = chunks.len();
        let mut report = BuildReport::default();
        info!("Building graph from {} chunks", total);

        for (index, chunk) in chunks.iter().enumerate() {
            observer.on_chunk_started(index, total);
            chunk.validate()?;

            let extraction = match self.extractor.extract(chunk).await {
                Ok(extraction) => extraction,
                Err(e) => {
                    warn!("Extraction failed for {}: {}", chunk.id, e);
                    report.extraction_failures += 1;
                    ConceptExtraction::default()
                }
            };

            self.store_chunk(chunk, &extraction, &mut report).await?;

            report.chunks_processed += 1;
            observer.on_chunk_finished(index, total);
        }

        info!(
            "Graph build complete: {} concepts, {} relations, {} failed extractions",
            report.concepts_upserted, report.relations_created, report.extraction_failures
        );
        observer.on_complete(&report);
        Ok(report)
    }

    async fn store_chunk(
        &self,
        chunk: &DocumentChunk,
        extraction: &ConceptExtraction,
        report: &mut BuildReport,
    ) -> Result<()> {
        self.repo.upsert_chunk(chunk).await?;

        for concept in extraction.concepts.iter().filter_map(ExtractedConcept::to_node) {
            self.repo.upsert_concept(&concept).await?;
            self.repo
                .link_mention(&chunk.id, &concept.name, concept.importance)
                .await?;
            report.concepts_upserted += 1;
        }

        for relationship in &extraction.relationships {
            let edge = relationship.to_edge();
            if self.repo.relate_concepts(&edge).await? {
                report.relations_created += 1;
            } else {
                debug!("Dropped relation {} -> {}", edge.source, edge.target);
            }
        }

        Ok(())
    }
}
