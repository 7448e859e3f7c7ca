//! Graph query contract used by the question-answering pipeline

use crate::Result;
use async_trait::async_trait;
use conceptgraph_core::{ConceptNode, DocumentChunk, Neighbor};
use conceptgraph_db::Repository;

/// Read-only queries the pipeline issues against the graph store.
///
/// Empty results are not errors; they mean the graph has nothing relevant.
#[async_trait]
pub trait GraphQueryAdapter: Send + Sync {
    /// Concepts whose name contains `keyword` (case-insensitive), by importance descending
    async fn match_by_keyword(&self, keyword: &str, limit: usize) -> Result<Vec<ConceptNode>>;

    /// Concepts directly related to `name`, by relation strength descending
    async fn expand_neighbors(&self, name: &str, limit: usize) -> Result<Vec<Neighbor>>;

    /// Chunks mentioning `name`, by chunk index ascending
    async fn mentions_of(&self, name: &str, limit: usize) -> Result<Vec<DocumentChunk>>;

    /// The most important concepts in the graph
    async fn top_concepts_by_importance(&self, limit: usize) -> Result<Vec<ConceptNode>>;
}

#[async_trait]
impl GraphQueryAdapter for Repository {
    async fn match_by_keyword(&self, keyword: &str, limit: usize) -> Result<Vec<ConceptNode>> {
        Ok(Repository::match_by_keyword(self, keyword, limit).await?)
    }

    async fn expand_neighbors(&self, name: &str, limit: usize) -> Result<Vec<Neighbor>> {
        Ok(Repository::expand_neighbors(self, name, limit).await?)
    }

    async fn mentions_of(&self, name: &str, limit: usize) -> Result<Vec<DocumentChunk>> {
        Ok(Repository::mentions_of(self, name, limit).await?)
    }

    async fn top_concepts_by_importance(&self, limit: usize) -> Result<Vec<ConceptNode>> {
        Ok(Repository::top_concepts_by_importance(self, limit).await?)
    }
}
