//! Repository pattern for graph store operations

use crate::{DbConnection, DbError, Result};
use conceptgraph_core::edge::DEFAULT_STRENGTH;
use conceptgraph_core::{ConceptNode, DocumentChunk, GraphSnapshot, Neighbor, RelationEdge};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Repository for all database operations
#[derive(Clone)]
pub struct Repository {
    db: DbConnection,
}

impl Repository {
    /// Create a new repository
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    // ==========================================
    // WRITE OPERATIONS
    // ==========================================

    /// Create or overwrite a concept keyed by name
    #[instrument(skip(self, concept), fields(name = %concept.name))]
    pub async fn upsert_concept(&self, concept: &ConceptNode) -> Result<()> {
        self.db
            .query(
                r#"
                UPSERT type::thing('concept', $name) SET
                    name = $name,
                    concept_type = $concept_type,
                    importance = $importance,
                    updated_at = time::now()
            "#,
            )
            .bind(("name", concept.name.clone()))
            .bind(("concept_type", concept.concept_type.to_string()))
            .bind(("importance", concept.importance))
            .await?
            .check()?;

        Ok(())
    }

    /// Store a document chunk keyed by its id
    #[instrument(skip(self, chunk), fields(id = %chunk.id))]
    pub async fn upsert_chunk(&self, chunk: &DocumentChunk) -> Result<()> {
        self.db
            .query(
                r#"
                UPSERT type::thing('chunk', $chunk_id) SET
                    chunk_id = $chunk_id,
                    text = $text,
                    source = $source,
                    chunk_index = $chunk_index
            "#,
            )
            .bind(("chunk_id", chunk.id.clone()))
            .bind(("text", chunk.text.clone()))
            .bind(("source", chunk.source.clone()))
            .bind(("chunk_index", chunk.chunk_index))
            .await?
            .check()?;

        Ok(())
    }

    /// Record that a chunk mentions a concept (one edge per pair)
    #[instrument(skip(self))]
    pub async fn link_mention(&self, chunk_id: &str, concept_name: &str, strength: f32) -> Result<()> {
        self.db
            .query(
                r#"
                LET $chunk = type::thing('chunk', $chunk_id);
                LET $concept = type::thing('concept', $concept_name);
                DELETE mentions WHERE in = $chunk AND out = $concept;
                RELATE $chunk->mentions->$concept SET strength = $strength, created_at = time::now();
            "#,
            )
            .bind(("chunk_id", chunk_id.to_string()))
            .bind(("concept_name", concept_name.to_string()))
            .bind(("strength", strength))
            .await?
            .check()?;

        Ok(())
    }

    /// Merge a directed relation between two existing concepts.
    ///
    /// Edges are unique on (source, target, type); a repeat overwrites the
    /// strength. Returns `false` without writing when either endpoint is missing.
    #[instrument(skip(self, edge), fields(source = %edge.source, target = %edge.target))]
    pub async fn relate_concepts(&self, edge: &RelationEdge) -> Result<bool> {
        if self.get_concept(&edge.source).await?.is_none()
            || self.get_concept(&edge.target).await?.is_none()
        {
            debug!("Skipping relation with unknown endpoint");
            return Ok(false);
        }

        let (source, target, relation_type) = edge.merge_key();
        self.db
            .query(
                r#"
                LET $source = type::thing('concept', $source_name);
                LET $target = type::thing('concept', $target_name);
                DELETE relates_to WHERE in = $source AND out = $target AND relation_type = $relation_type;
                RELATE $source->relates_to->$target SET
                    relation_type = $relation_type,
                    strength = $strength,
                    updated_at = time::now();
            "#,
            )
            .bind(("source_name", source.to_string()))
            .bind(("target_name", target.to_string()))
            .bind(("relation_type", relation_type.to_string()))
            .bind(("strength", edge.strength))
            .await?
            .check()?;

        Ok(true)
    }

    /// Delete every concept, chunk and edge
    #[instrument(skip(self))]
    pub async fn clear_graph(&self) -> Result<()> {
        self.db
            .query("DELETE relates_to; DELETE mentions; DELETE concept; DELETE chunk;")
            .await?
            .check()?;

        Ok(())
    }

    // ==========================================
    // READ OPERATIONS
    // ==========================================

    /// Get a concept by exact name
    #[instrument(skip(self))]
    pub async fn get_concept(&self, name: &str) -> Result<Option<ConceptNode>> {
        let concept: Option<ConceptNode> = self.db.select(("concept", name)).await?;
        Ok(concept)
    }

    /// Concepts whose name contains `keyword` (case-insensitive), most important first
    #[instrument(skip(self))]
    pub async fn match_by_keyword(&self, keyword: &str, limit: usize) -> Result<Vec<ConceptNode>> {
        let concepts: Vec<ConceptNode> = self
            .db
            .query(
                r#"
                SELECT
                    name,
                    concept_type,
                    importance,
                    array::len(<-mentions) AS mentions_count
                FROM concept
                WHERE string::contains(string::lowercase(name), $keyword)
                ORDER BY importance DESC
                LIMIT $limit
            "#,
            )
            .bind(("keyword", keyword.to_lowercase()))
            .bind(("limit", limit))
            .await?
            .take(0)?;

        Ok(concepts)
    }

    /// Concepts related to `name` in either direction, strongest relation first
    #[instrument(skip(self))]
    pub async fn expand_neighbors(&self, name: &str, limit: usize) -> Result<Vec<Neighbor>> {
        let mut response = self
            .db
            .query(
                r#"
                LET $concept = type::thing('concept', $name);
                SELECT
                    out.name AS name,
                    out.concept_type AS concept_type,
                    out.importance AS importance,
                    strength AS relation_strength
                FROM relates_to
                WHERE in = $concept;
                SELECT
                    in.name AS name,
                    in.concept_type AS concept_type,
                    in.importance AS importance,
                    strength AS relation_strength
                FROM relates_to
                WHERE out = $concept;
            "#,
            )
            .bind(("name", name.to_string()))
            .await?;

        let mut rows: Vec<NeighborRow> = response.take(1)?;
        let incoming: Vec<NeighborRow> = response.take(2)?;
        rows.extend(incoming);

        // Sort and limit in Rust so both directions are ranked together
        let mut neighbors: Vec<Neighbor> = rows.into_iter().map(NeighborRow::into_neighbor).collect();
        neighbors.sort_by(|a, b| b.relation_strength.total_cmp(&a.relation_strength));
        neighbors.truncate(limit);

        Ok(neighbors)
    }

    /// Chunks that mention `name`, in chunk order
    #[instrument(skip(self))]
    pub async fn mentions_of(&self, name: &str, limit: usize) -> Result<Vec<DocumentChunk>> {
        let mut rows: Vec<ChunkRow> = self
            .db
            .query(
                r#"
                LET $concept = type::thing('concept', $name);
                SELECT
                    in.chunk_id AS chunk_id,
                    in.text AS text,
                    in.source AS source,
                    in.chunk_index AS chunk_index
                FROM mentions
                WHERE out = $concept;
            "#,
            )
            .bind(("name", name.to_string()))
            .await?
            .take(1)?;

        rows.sort_by_key(|row| row.chunk_index);
        rows.truncate(limit);

        Ok(rows.into_iter().map(ChunkRow::into_chunk).collect())
    }

    /// The most important concepts in the graph
    #[instrument(skip(self))]
    pub async fn top_concepts_by_importance(&self, limit: usize) -> Result<Vec<ConceptNode>> {
        let concepts: Vec<ConceptNode> = self
            .db
            .query(
                r#"
                SELECT
                    name,
                    concept_type,
                    importance,
                    array::len(<-mentions) AS mentions_count
                FROM concept
                ORDER BY importance DESC
                LIMIT $limit
            "#,
            )
            .bind(("limit", limit))
            .await?
            .take(0)?;

        Ok(concepts)
    }

    /// Every concept and relation, for visualisation consumers
    #[instrument(skip(self))]
    pub async fn graph_snapshot(&self) -> Result<GraphSnapshot> {
        let mut response = self
            .db
            .query(
                r#"
                SELECT
                    name,
                    concept_type,
                    importance,
                    array::len(<-mentions) AS mentions_count
                FROM concept
                ORDER BY name;
                SELECT
                    in.name AS source,
                    out.name AS target,
                    relation_type,
                    strength
                FROM relates_to;
            "#,
            )
            .await?;

        let nodes: Vec<ConceptNode> = response.take(0)?;
        let edges: Vec<RelationEdge> = response.take(1)?;

        Ok(GraphSnapshot { nodes, edges })
    }

    // ==========================================
    // STATS
    // ==========================================

    /// Get database statistics
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<DbStats> {
        let stats: Option<DbStats> = self
            .db
            .query(
                r#"
                RETURN {
                    concept_count: array::len((SELECT VALUE id FROM concept)),
                    chunk_count: array::len((SELECT VALUE id FROM chunk)),
                    relation_count: array::len((SELECT VALUE id FROM relates_to)),
                    mention_count: array::len((SELECT VALUE id FROM mentions))
                }
            "#,
            )
            .await?
            .take(0)?;

        stats.ok_or_else(|| DbError::QueryFailed("stats".into()))
    }
}

// ==========================================
// RESULT TYPES
// ==========================================

#[derive(Debug, Deserialize)]
struct NeighborRow {
    name: String,
    #[serde(default)]
    concept_type: Option<String>,
    #[serde(default)]
    importance: Option<f32>,
    #[serde(default)]
    relation_strength: Option<f32>,
}

impl NeighborRow {
    fn into_neighbor(self) -> Neighbor {
        let mut node = ConceptNode::new(self.name, self.concept_type.unwrap_or_default().into());
        if let Some(importance) = self.importance {
            node = node.with_importance(importance);
        }
        Neighbor {
            node,
            relation_strength: self.relation_strength.unwrap_or(DEFAULT_STRENGTH),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkRow {
    chunk_id: String,
    text: String,
    source: String,
    chunk_index: u32,
}

impl ChunkRow {
    fn into_chunk(self) -> DocumentChunk {
        DocumentChunk::new(self.chunk_id, self.text, self.source, self.chunk_index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DbStats {
    #[serde(default)]
    pub concept_count: i64,
    #[serde(default)]
    pub chunk_count: i64,
    #[serde(default)]
    pub relation_count: i64,
    #[serde(default)]
    pub mention_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_memory;
    use conceptgraph_core::ConceptType;

    async fn repo() -> Repository {
        Repository::new(init_memory().await.unwrap())
    }

    fn concept(name: &str, importance: f32) -> ConceptNode {
        ConceptNode::new(name, ConceptType::Concept).with_importance(importance)
    }

    #[tokio::test]
    async fn test_upsert_and_get_concept() {
        let repo = repo().await;

        repo.upsert_concept(&concept("Neural Networks", 0.9)).await.unwrap();
        let stored = repo.get_concept("Neural Networks").await.unwrap().unwrap();
        assert_eq!(stored.name, "Neural Networks");
        assert_eq!(stored.concept_type, ConceptType::Concept);

        // Names are case-sensitive keys
        assert!(repo.get_concept("neural networks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_last_write_wins() {
        let repo = repo().await;

        repo.upsert_concept(&concept("rust", 0.2)).await.unwrap();
        repo.upsert_concept(
            &ConceptNode::new("rust", ConceptType::Topic).with_importance(0.7),
        )
        .await
        .unwrap();

        let stored = repo.get_concept("rust").await.unwrap().unwrap();
        assert_eq!(stored.concept_type, ConceptType::Topic);
        assert!((stored.importance - 0.7).abs() < 1e-6);

        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.concept_count, 1);
    }

    #[tokio::test]
    async fn test_match_by_keyword() {
        let repo = repo().await;

        repo.upsert_concept(&concept("Machine Learning", 0.4)).await.unwrap();
        repo.upsert_concept(&concept("Deep Learning", 0.8)).await.unwrap();
        repo.upsert_concept(&concept("Rust", 0.9)).await.unwrap();

        let matches = repo.match_by_keyword("LEARNING", 5).await.unwrap();
        let names: Vec<&str> = matches.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Deep Learning", "Machine Learning"]);

        let limited = repo.match_by_keyword("learning", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        assert!(repo.match_by_keyword("quantum", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mentions_are_counted_and_ordered() {
        let repo = repo().await;
        repo.upsert_concept(&concept("graphs", 0.6)).await.unwrap();

        for index in [2u32, 0, 1] {
            let chunk = DocumentChunk::new(
                format!("chunk_{}", index),
                format!("Text of chunk {} about graphs", index),
                "doc.txt",
                index,
            );
            repo.upsert_chunk(&chunk).await.unwrap();
            repo.link_mention(&chunk.id, "graphs", 0.6).await.unwrap();
        }
        // Linking twice does not duplicate the mention
        repo.link_mention("chunk_0", "graphs", 0.6).await.unwrap();

        let chunks = repo.mentions_of("graphs", 2).await.unwrap();
        let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(chunks[0].id, "chunk_0");
        assert_eq!(chunks[0].source, "doc.txt");

        let matches = repo.match_by_keyword("graph", 5).await.unwrap();
        assert_eq!(matches[0].mentions_count, 3);

        assert!(repo.mentions_of("unknown", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expand_neighbors_both_directions() {
        let repo = repo().await;
        for (name, importance) in [("a", 0.5), ("b", 0.6), ("c", 0.7), ("d", 0.8)] {
            repo.upsert_concept(&concept(name, importance)).await.unwrap();
        }

        repo.relate_concepts(&RelationEdge::new("a", "b").with_strength(0.3)).await.unwrap();
        repo.relate_concepts(&RelationEdge::new("c", "a").with_strength(0.9)).await.unwrap();
        repo.relate_concepts(&RelationEdge::new("a", "d").with_strength(0.6)).await.unwrap();

        let neighbors = repo.expand_neighbors("a", 2).await.unwrap();
        let names: Vec<&str> = neighbors.iter().map(|n| n.node.name.as_str()).collect();
        assert_eq!(names, vec!["c", "d"]);
        assert!((neighbors[0].relation_strength - 0.9).abs() < 1e-6);
        assert_eq!(neighbors[0].node.mentions_count, 0);
    }

    #[tokio::test]
    async fn test_relations_merge_on_type() {
        let repo = repo().await;
        repo.upsert_concept(&concept("a", 0.5)).await.unwrap();
        repo.upsert_concept(&concept("b", 0.5)).await.unwrap();

        let edge = RelationEdge::new("a", "b").with_strength(0.2);
        assert!(repo.relate_concepts(&edge).await.unwrap());
        assert!(repo.relate_concepts(&edge.clone().with_strength(0.7)).await.unwrap());
        assert!(repo
            .relate_concepts(&RelationEdge::new("a", "b").with_type("contains"))
            .await
            .unwrap());

        let snapshot = repo.graph_snapshot().await.unwrap();
        assert_eq!(snapshot.edges.len(), 2);
        let relates = snapshot
            .edges
            .iter()
            .find(|e| e.relation_type == "relates_to")
            .unwrap();
        assert!((relates.strength - 0.7).abs() < 1e-6);
        assert_eq!(relates.merge_key(), ("a", "b", "relates_to"));
    }

    #[tokio::test]
    async fn test_relation_requires_both_endpoints() {
        let repo = repo().await;
        repo.upsert_concept(&concept("a", 0.5)).await.unwrap();

        let created = repo.relate_concepts(&RelationEdge::new("a", "ghost")).await.unwrap();
        assert!(!created);
        assert_eq!(repo.get_stats().await.unwrap().relation_count, 0);
    }

    #[tokio::test]
    async fn test_top_concepts_and_clear() {
        let repo = repo().await;
        for (name, importance) in [("low", 0.1), ("high", 0.9), ("mid", 0.5)] {
            repo.upsert_concept(&concept(name, importance)).await.unwrap();
        }

        let top = repo.top_concepts_by_importance(2).await.unwrap();
        let names: Vec<&str> = top.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid"]);

        repo.clear_graph().await.unwrap();
        assert!(repo.top_concepts_by_importance(5).await.unwrap().is_empty());
        assert!(repo.graph_snapshot().await.unwrap().is_empty());
    }
}
