//! Context assembly - supporting passages for the ranked concepts

use crate::{GraphQueryAdapter, Result};
use conceptgraph_core::{ContextPassage, RankedCandidate};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Ranked concepts whose mentions are fetched
pub const CONTEXT_NODE_LIMIT: usize = 10;
/// Chunks fetched per concept
pub const MENTIONS_PER_NODE: usize = 3;
/// Passages handed to synthesis
pub const MAX_PASSAGES: usize = 8;

pub struct ContextAssembler {
    graph: Arc<dyn GraphQueryAdapter>,
}

impl ContextAssembler {
    pub fn new(graph: Arc<dyn GraphQueryAdapter>) -> Self {
        Self { graph }
    }

    /// Collect distinct passages mentioning the top ranked concepts, in rank order
    #[instrument(skip(self, nodes), fields(nodes = nodes.len()))]
    pub async fn assemble(&self, nodes: &[RankedCandidate]) -> Result<Vec<ContextPassage>> {
        let top = &nodes[..nodes.len().min(CONTEXT_NODE_LIMIT)];

        let per_node = try_join_all(
            top.iter()
                .map(|candidate| self.graph.mentions_of(candidate.name(), MENTIONS_PER_NODE)),
        )
        .await?;

        let passages = top.iter().zip(per_node).flat_map(|(candidate, chunks)| {
            chunks
                .into_iter()
                .map(move |chunk| ContextPassage::from_chunk(chunk, candidate.name()))
        });

        let unique = dedup_passages(passages);
        debug!("Assembled {} passages", unique.len());
        Ok(unique)
    }
}

/// Keep the first passage per fingerprint, up to `MAX_PASSAGES`
pub fn dedup_passages(passages: impl IntoIterator<Item = ContextPassage>) -> Vec<ContextPassage> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for passage in passages {
        if unique.len() == MAX_PASSAGES {
            break;
        }
        if seen.insert(passage.fingerprint().to_string()) {
            unique.push(passage);
        }
    }

    unique
}
