//! Retrieval results

use serde::Serialize;

use super::ingestion::Chunk;

/// A chunk returned for a query, with its distance to the query vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

impl RetrievedChunk {
    pub fn new(chunk: Chunk, distance: f32) -> Self {
        Self { chunk, distance }
    }
}

/// Chunks ordered by ascending distance to a query (nearest first)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    items: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn new(items: Vec<RetrievedChunk>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetrievedChunk> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Chunk texts in rank order
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.chunk.text()).collect()
    }

    /// Source identifier of every chunk, in rank order
    pub fn sources(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|r| r.chunk.source().to_string())
            .collect()
    }
}
