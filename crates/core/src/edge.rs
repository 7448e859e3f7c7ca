//! Edge types - relationships between concepts

use serde::{Deserialize, Serialize};

use crate::concept::clamp_unit;

/// Relation type used when the extractor gives none
pub const DEFAULT_RELATION_TYPE: &str = "relates_to";

/// Strength assumed when a relation carries none
pub const DEFAULT_STRENGTH: f32 = 0.5;

fn default_strength() -> f32 {
    DEFAULT_STRENGTH
}

fn default_relation_type() -> String {
    DEFAULT_RELATION_TYPE.to_string()
}

/// A directed, typed, weighted relation between two concepts.
///
/// Edges are deduplicated on `(source, target, relation_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationEdge {
    /// Name of the source concept
    pub source: String,

    /// Name of the target concept
    pub target: String,

    #[serde(default = "default_relation_type", alias = "type")]
    pub relation_type: String,

    /// Strength in [0, 1]
    #[serde(default = "default_strength")]
    pub strength: f32,
}

impl RelationEdge {
    /// Create a new edge with the default type and strength
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: DEFAULT_RELATION_TYPE.to_string(),
            strength: DEFAULT_STRENGTH,
        }
    }

    /// Builder: set relation type
    pub fn with_type(mut self, relation_type: impl Into<String>) -> Self {
        self.relation_type = relation_type.into();
        self
    }

    /// Builder: set strength (clamped to [0, 1])
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = clamp_unit(strength);
        self
    }

    /// The key edges are merged on: (source, target, relation type)
    pub fn merge_key(&self) -> (&str, &str, &str) {
        (&self.source, &self.target, &self.relation_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_creation() {
        let edge = RelationEdge::new("neural networks", "deep learning")
            .with_type("contains")
            .with_strength(0.8);

        assert_eq!(edge.source, "neural networks");
        assert_eq!(edge.target, "deep learning");
        assert_eq!(edge.relation_type, "contains");
        assert_eq!(edge.strength, 0.8);
        assert_eq!(edge.merge_key(), ("neural networks", "deep learning", "contains"));
    }

    #[test]
    fn test_edge_defaults() {
        let edge: RelationEdge =
            serde_json::from_str(r#"{"source": "a", "target": "b"}"#).unwrap();
        assert_eq!(edge.relation_type, DEFAULT_RELATION_TYPE);
        assert_eq!(edge.strength, DEFAULT_STRENGTH);
        assert_eq!(RelationEdge::new("a", "b").with_strength(3.0).strength, 1.0);
    }
}
