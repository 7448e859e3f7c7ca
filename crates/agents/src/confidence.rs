//! Heuristic confidence for an answer

use conceptgraph_core::{ContextPassage, RankedCandidate};

/// Confidence reported when there is nothing to ground an answer on
pub const MIN_CONFIDENCE: f32 = 0.1;

const BREADTH_WEIGHT: f32 = 0.3;
const DEPTH_WEIGHT: f32 = 0.3;
const IMPORTANCE_WEIGHT: f32 = 0.2;
const COVERAGE_WEIGHT: f32 = 0.2;

const BREADTH_SATURATION: f32 = 10.0;
const DEPTH_SATURATION_CHARS: f32 = 1000.0;

/// Score in [0, 1] from how much the graph had to offer for this question
pub fn score_confidence(
    keywords: &[String],
    nodes: &[RankedCandidate],
    passages: &[ContextPassage],
) -> f32 {
    if nodes.is_empty() || passages.is_empty() {
        return MIN_CONFIDENCE;
    }

    let breadth = (nodes.len() as f32 / BREADTH_SATURATION).min(1.0);

    let depth = passages
        .iter()
        .map(|p| (p.text.chars().count() as f32 / DEPTH_SATURATION_CHARS).min(1.0))
        .sum::<f32>()
        / passages.len() as f32;

    let importance =
        nodes.iter().map(|c| c.node.importance).sum::<f32>() / nodes.len() as f32;

    let names: Vec<String> = nodes.iter().map(|c| c.name().to_lowercase()).collect();
    let covered = keywords
        .iter()
        .filter(|keyword| names.iter().any(|name| name.contains(keyword.as_str())))
        .count();
    let coverage = covered as f32 / keywords.len().max(1) as f32;

    let total = breadth * BREADTH_WEIGHT
        + depth * DEPTH_WEIGHT
        + importance * IMPORTANCE_WEIGHT
        + coverage * COVERAGE_WEIGHT;

    total.clamp(0.0, 1.0)
}
