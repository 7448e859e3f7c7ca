//! Concept types - the named nodes of the knowledge graph

use serde::{Deserialize, Serialize};

/// Importance assumed when a concept carries none
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// The classification of a concept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum ConceptType {
    /// A named thing (person, organization, product...)
    Entity,
    /// A subject area or theme
    Topic,
    /// An abstract idea
    Concept,
    /// Anything the extractor could not classify
    #[default]
    Default,
}

impl ConceptType {
    /// Map a free-form label coming from the extractor onto a known type
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "entity" | "person" | "organization" | "org" | "location" | "product" => Self::Entity,
            "topic" | "category" | "theme" => Self::Topic,
            "concept" | "idea" => Self::Concept,
            _ => Self::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptType::Entity => "entity",
            ConceptType::Topic => "topic",
            ConceptType::Concept => "concept",
            ConceptType::Default => "default",
        }
    }
}

impl From<String> for ConceptType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<ConceptType> for String {
    fn from(concept_type: ConceptType) -> Self {
        concept_type.as_str().to_string()
    }
}

impl std::fmt::Display for ConceptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_importance() -> f32 {
    DEFAULT_IMPORTANCE
}

/// A concept node. `name` is the identity key across the whole graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptNode {
    pub name: String,

    #[serde(default, alias = "type")]
    pub concept_type: ConceptType,

    /// Importance in [0, 1]
    #[serde(default = "default_importance")]
    pub importance: f32,

    /// Number of chunks mentioning this concept
    #[serde(default)]
    pub mentions_count: u32,
}

impl ConceptNode {
    /// Create a concept with default importance and no mentions
    pub fn new(name: impl Into<String>, concept_type: ConceptType) -> Self {
        Self {
            name: name.into(),
            concept_type,
            importance: DEFAULT_IMPORTANCE,
            mentions_count: 0,
        }
    }

    /// Builder: set importance (clamped to [0, 1])
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = clamp_unit(importance);
        self
    }

    /// Builder: set mention count
    pub fn with_mentions(mut self, mentions_count: u32) -> Self {
        self.mentions_count = mentions_count;
        self
    }

    /// Case-insensitive substring match, as used by keyword search
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.name.to_lowercase().contains(&keyword.to_lowercase())
    }
}

/// Clamp a weight into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_creation() {
        let concept = ConceptNode::new("Neural Networks", ConceptType::Concept)
            .with_importance(0.9)
            .with_mentions(4);

        assert_eq!(concept.name, "Neural Networks");
        assert_eq!(concept.concept_type, ConceptType::Concept);
        assert_eq!(concept.importance, 0.9);
        assert_eq!(concept.mentions_count, 4);
    }

    #[test]
    fn test_importance_is_clamped() {
        assert_eq!(ConceptNode::new("a", ConceptType::Topic).with_importance(1.7).importance, 1.0);
        assert_eq!(ConceptNode::new("a", ConceptType::Topic).with_importance(-0.2).importance, 0.0);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
    }

    #[test]
    fn test_type_from_label() {
        assert_eq!(ConceptType::from_label("Entity"), ConceptType::Entity);
        assert_eq!(ConceptType::from_label(" topic "), ConceptType::Topic);
        assert_eq!(ConceptType::from_label("concept"), ConceptType::Concept);
        assert_eq!(ConceptType::from_label("gizmo"), ConceptType::Default);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let node: ConceptNode = serde_json::from_str(r#"{"name": "deep learning"}"#).unwrap();
        assert_eq!(node.importance, DEFAULT_IMPORTANCE);
        assert_eq!(node.mentions_count, 0);
        assert_eq!(node.concept_type, ConceptType::Default);

        let node: ConceptNode =
            serde_json::from_str(r#"{"name": "x", "type": "something-else"}"#).unwrap();
        assert_eq!(node.concept_type, ConceptType::Default);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let node = ConceptNode::new("Machine Learning", ConceptType::Topic);
        assert!(node.matches_keyword("learning"));
        assert!(node.matches_keyword("MACHINE"));
        assert!(!node.matches_keyword("deep"));
    }
}
