//! Relevance ranking - merges keyword matches and neighbor expansion

use crate::{GraphQueryAdapter, Result};
use conceptgraph_core::{ConceptNode, Neighbor, RankedCandidate};
use futures::future::try_join_all;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Concepts fetched per keyword
pub const KEYWORD_MATCH_LIMIT: usize = 5;
/// Distinct keyword matches whose neighbors are explored
pub const EXPANSION_SEEDS: usize = 5;
/// Neighbors fetched per seed
pub const NEIGHBOR_LIMIT: usize = 3;
/// Length of the ranked list
pub const MAX_RELEVANT_NODES: usize = 15;

const IMPORTANCE_WEIGHT: f32 = 0.6;
const MENTIONS_WEIGHT: f32 = 0.3;
const RELATION_WEIGHT: f32 = 0.1;
const MENTIONS_SATURATION: f32 = 10.0;
const DEFAULT_RELATION_STRENGTH: f32 = 0.5;

/// Produces the most relevant concepts for a set of keywords
pub struct RelevanceRanker {
    graph: Arc<dyn GraphQueryAdapter>,
}

impl RelevanceRanker {
    pub fn new(graph: Arc<dyn GraphQueryAdapter>) -> Self {
        Self { graph }
    }

    /// Rank concepts for `keywords`. No keywords or no matches gives an empty list.
    ///
    /// Queries run concurrently but results are merged in submission order,
    /// so the ranking is the same as a sequential run.
    #[instrument(skip(self))]
    pub async fn rank(&self, keywords: &[String]) -> Result<Vec<RankedCandidate>> {
        let per_keyword = try_join_all(
            keywords
                .iter()
                .map(|keyword| self.graph.match_by_keyword(keyword, KEYWORD_MATCH_LIMIT)),
        )
        .await?;
        let matches: Vec<ConceptNode> = per_keyword.into_iter().flatten().collect();

        if matches.is_empty() {
            debug!("No concepts matched the keywords");
            return Ok(Vec::new());
        }

        let seeds = distinct_names(&matches, EXPANSION_SEEDS);
        let per_seed = try_join_all(
            seeds
                .iter()
                .map(|name| self.graph.expand_neighbors(name, NEIGHBOR_LIMIT)),
        )
        .await?;
        let expansions: Vec<Neighbor> = per_seed.into_iter().flatten().collect();

        debug!(
            "Ranking {} keyword matches and {} expansions",
            matches.len(),
            expansions.len()
        );

        Ok(rank_candidates(merge_candidates(matches, expansions)))
    }
}

/// The first `limit` distinct concept names, in discovery order
fn distinct_names(nodes: &[ConceptNode], limit: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(limit);
    for node in nodes {
        if names.len() == limit {
            break;
        }
        if !names.contains(&node.name) {
            names.push(node.name.clone());
        }
    }
    names
}

/// Merge keyword matches and expansions, keeping the first record per name.
///
/// A relation strength seen on a later duplicate is still carried onto the
/// kept record when it has none.
pub fn merge_candidates(matches: Vec<ConceptNode>, expansions: Vec<Neighbor>) -> Vec<RankedCandidate> {
    let mut merged: Vec<RankedCandidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let candidates = matches
        .into_iter()
        .map(RankedCandidate::matched)
        .chain(
            expansions
                .into_iter()
                .map(|n| RankedCandidate::expanded(n.node, n.relation_strength)),
        );

    for candidate in candidates {
        match positions.entry(candidate.node.name.clone()) {
            Entry::Occupied(e) => {
                let kept = &mut merged[*e.get()];
                if kept.relation_strength.is_none() {
                    kept.relation_strength = candidate.relation_strength;
                }
            }
            Entry::Vacant(e) => {
                e.insert(merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}

/// Composite score from importance, mention count and relation strength
pub fn relevance_score(candidate: &RankedCandidate) -> f32 {
    let mentions = (candidate.node.mentions_count as f32 / MENTIONS_SATURATION).min(1.0);
    let relation = candidate
        .relation_strength
        .unwrap_or(DEFAULT_RELATION_STRENGTH);

    candidate.node.importance * IMPORTANCE_WEIGHT
        + mentions * MENTIONS_WEIGHT
        + relation * RELATION_WEIGHT
}

/// Score, sort descending (ties keep merge order) and keep the top entries
pub fn rank_candidates(mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    for candidate in &mut candidates {
        candidate.relevance_score = relevance_score(candidate);
    }
    candidates.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    candidates.truncate(MAX_RELEVANT_NODES);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubGraph;
    use conceptgraph_core::ConceptType;

    fn node(name: &str, importance: f32, mentions: u32) -> ConceptNode {
        ConceptNode::new(name, ConceptType::Concept)
            .with_importance(importance)
            .with_mentions(mentions)
    }

    #[test]
    fn test_score_formula() {
        let matched = RankedCandidate::matched(node("a", 0.9, 4));
        // 0.9*0.6 + 0.4*0.3 + 0.5*0.1
        assert!((relevance_score(&matched) - 0.71).abs() < 1e-6);

        let expanded = RankedCandidate::expanded(node("b", 0.5, 0), 0.8);
        // 0.5*0.6 + 0 + 0.8*0.1
        assert!((relevance_score(&expanded) - 0.38).abs() < 1e-6);

        let saturated = RankedCandidate::matched(node("c", 0.0, 50));
        assert!((relevance_score(&saturated) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_merge_keeps_first_and_carries_strength() {
        let matches = vec![node("a", 0.3, 1), node("b", 0.4, 2), node("a", 0.9, 9)];
        let expansions = vec![
            Neighbor::new(node("a", 0.1, 0), 0.9),
            Neighbor::new(node("c", 0.2, 0), 0.7),
            Neighbor::new(node("c", 0.8, 0), 0.1),
        ];

        let merged = merge_candidates(matches, expansions);
        let names: Vec<&str> = merged.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        // First occurrence wins wholesale, except for the carried strength
        assert_eq!(merged[0].node.importance, 0.3);
        assert_eq!(merged[0].node.mentions_count, 1);
        assert_eq!(merged[0].relation_strength, Some(0.9));
        assert_eq!(merged[1].relation_strength, None);
        assert_eq!(merged[2].relation_strength, Some(0.7));
        assert_eq!(merged[2].node.importance, 0.2);
    }

    #[test]
    fn test_rank_is_sorted_stable_and_bounded() {
        let candidates: Vec<RankedCandidate> = (0..20)
            .map(|i| RankedCandidate::matched(node(&format!("n{}", i), 0.5, 0)))
            .chain(std::iter::once(RankedCandidate::matched(node("top", 1.0, 10))))
            .collect();

        let ranked = rank_candidates(candidates);
        assert_eq!(ranked.len(), MAX_RELEVANT_NODES);
        assert_eq!(ranked[0].name(), "top");
        // Equal scores keep merge order
        assert_eq!(ranked[1].name(), "n0");
        assert_eq!(ranked[14].name(), "n13");
        assert!(ranked
            .windows(2)
            .all(|w| w[0].relevance_score >= w[1].relevance_score));
    }

    #[test]
    fn test_distinct_names() {
        let nodes = vec![node("a", 0.5, 0), node("a", 0.5, 0), node("b", 0.5, 0)];
        assert_eq!(distinct_names(&nodes, 5), vec!["a", "b"]);
        assert_eq!(distinct_names(&nodes, 1), vec!["a"]);
    }

    #[tokio::test]
    async fn test_rank_with_stub_graph() {
        let graph = StubGraph::default()
            .with_concept(node("neural networks", 0.9, 4))
            .with_concept(node("networks of roads", 0.2, 0))
            .with_relation("neural networks", node("deep learning", 0.7, 0), 0.8);

        let ranker = RelevanceRanker::new(Arc::new(graph));
        let ranked = ranker
            .rank(&["neural".to_string(), "networks".to_string()])
            .await
            .unwrap();

        let names: Vec<&str> = ranked.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["neural networks", "deep learning", "networks of roads"]);
        assert_eq!(ranked[1].relation_strength, Some(0.8));
    }

    #[tokio::test]
    async fn test_no_keywords_or_matches_is_empty() {
        let ranker = RelevanceRanker::new(Arc::new(StubGraph::default()));
        assert!(ranker.rank(&[]).await.unwrap().is_empty());
        assert!(ranker.rank(&["anything".to_string()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_graph_failure_propagates() {
        let ranker = RelevanceRanker::new(Arc::new(StubGraph::failing()));
        assert!(ranker.rank(&["anything".to_string()]).await.is_err());
    }
}
