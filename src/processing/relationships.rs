//! Chunk relationship graph: adjacency plus shared-heading links.
//!
//! Linking is a whole-list batch step. A chunk can share a heading with any later chunk, so
//! it must run once every chunk of the document is known.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::types::Chunk;

/// Populate `related_chunk_ids` on every chunk.
///
/// Order per chunk: previous neighbour, next neighbour, then every other chunk sharing at
/// least one parent heading, in ascending index order. A chunk never lists itself.
pub fn link_related_chunks(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    let heading_sets: Vec<HashSet<&str>> = chunks
        .iter()
        .map(|chunk| chunk.parent_headings.iter().map(String::as_str).collect())
        .collect();

    let count = chunks.len();
    let mut related: Vec<Vec<Uuid>> = Vec::with_capacity(count);
    for index in 0..count {
        let mut ids = Vec::new();
        if index > 0 {
            ids.push(chunks[index - 1].chunk_id);
        }
        if index + 1 < count {
            ids.push(chunks[index + 1].chunk_id);
        }
        for (other, chunk) in chunks.iter().enumerate() {
            if other == index || ids.contains(&chunk.chunk_id) {
                continue;
            }
            if !heading_sets[index].is_disjoint(&heading_sets[other]) {
                ids.push(chunk.chunk_id);
            }
        }
        related.push(ids);
    }

    for (chunk, ids) in chunks.iter_mut().zip(related) {
        chunk.related_chunk_ids = ids;
    }
    chunks
}

/// Read-only view of the per-document relationship graph, keyed by chunk id.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    edges: HashMap<Uuid, Vec<Uuid>>,
}

impl RelationshipGraph {
    /// Index the `related_chunk_ids` of already-linked chunks.
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let edges = chunks
            .iter()
            .map(|chunk| (chunk.chunk_id, chunk.related_chunk_ids.clone()))
            .collect();
        Self { edges }
    }

    /// Related ids of `chunk_id` in stored order; empty for unknown ids.
    pub fn related(&self, chunk_id: &Uuid) -> &[Uuid] {
        self.edges.get(chunk_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of chunks in the graph.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when the graph holds no chunk.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Expand retrieved chunk ids with their one-hop neighbours.
    ///
    /// Seeds come first in the order given (duplicates dropped), followed by each seed's
    /// related ids in stored order. The result holds at most `limit` ids.
    pub fn expand(&self, seeds: &[Uuid], limit: usize) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::new();

        for id in seeds {
            if expanded.len() >= limit {
                return expanded;
            }
            if seen.insert(*id) {
                expanded.push(*id);
            }
        }

        for id in seeds {
            for neighbour in self.related(id) {
                if expanded.len() >= limit {
                    return expanded;
                }
                if seen.insert(*neighbour) {
                    expanded.push(*neighbour);
                }
            }
        }

        expanded
    }
}
