//! Whole-graph views handed to visualisation and reporting consumers

use crate::{ConceptNode, RelationEdge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every concept and relation in the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<RelationEdge>,
}

/// A concept reached by following a relation from another concept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    pub node: ConceptNode,
    pub relation_strength: f32,
}

impl Neighbor {
    pub fn new(node: ConceptNode, relation_strength: f32) -> Self {
        Self {
            node,
            relation_strength,
        }
    }
}

/// Summary figures for a snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Concept count per type label
    pub type_counts: BTreeMap<String, usize>,
    pub average_importance: f32,
}

impl GraphStats {
    pub fn distinct_types(&self) -> usize {
        self.type_counts.len()
    }
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        let mut type_counts = BTreeMap::new();
        for node in &self.nodes {
            *type_counts.entry(node.concept_type.to_string()).or_insert(0) += 1;
        }

        let average_importance = if self.nodes.is_empty() {
            0.0
        } else {
            self.nodes.iter().map(|n| n.importance).sum::<f32>() / self.nodes.len() as f32
        };

        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            type_counts,
            average_importance,
        }
    }
}
