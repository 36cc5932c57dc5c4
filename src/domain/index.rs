//! In-memory vector index over embedded chunks
//!
//! An [`Index`] is built once from a full corpus, persisted, and then loaded
//! read-only for querying. The distance metric is fixed when the index is
//! built and travels with it; queries never choose their own metric.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ingestion::Chunk;
use super::retrieval::{RetrievalResult, RetrievedChunk};

/// Fixed-length embedding of a piece of text
pub type EmbeddingVector = Vec<f32>;

/// Distance function used to rank index entries against a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance
    #[default]
    L2,
    /// One minus cosine similarity
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length (smaller is closer)
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum(),
            Self::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => f.write_str("l2"),
            Self::Cosine => f.write_str("cosine"),
        }
    }
}

/// Calculate cosine similarity between two vectors
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Structural problems with an index or a query against it
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndexValidationError {
    #[error("index has no entries")]
    Empty,

    #[error("vectors must have at least one dimension")]
    ZeroDimension,

    #[error("entry {position} has dimension {actual}, expected {expected}")]
    EntryDimension {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("query has dimension {actual}, index has dimension {expected}")]
    QueryDimension { expected: usize, actual: usize },
}

/// One embedded chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: EmbeddingVector,
    pub chunk: Chunk,
}

impl IndexEntry {
    pub fn new(vector: EmbeddingVector, chunk: Chunk) -> Self {
        Self { vector, chunk }
    }
}

/// All entries for one corpus, plus the facts needed to query it correctly
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    embedding_model: String,
    dimension: usize,
    metric: DistanceMetric,
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Assemble an index, checking that it is non-empty and that every
    /// vector has the same dimension
    pub fn new(
        embedding_model: impl Into<String>,
        metric: DistanceMetric,
        entries: Vec<IndexEntry>,
    ) -> Result<Self, IndexValidationError> {
        let first = entries.first().ok_or(IndexValidationError::Empty)?;
        let dimension = first.vector.len();

        if dimension == 0 {
            return Err(IndexValidationError::ZeroDimension);
        }

        if let Some((position, entry)) = entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.vector.len() != dimension)
        {
            return Err(IndexValidationError::EntryDimension {
                position,
                expected: dimension,
                actual: entry.vector.len(),
            });
        }

        Ok(Self {
            embedding_model: embedding_model.into(),
            dimension,
            metric,
            entries,
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` entries closest to `query`, nearest first
    ///
    /// Equal distances keep insertion order. When `k` exceeds the index size
    /// every entry is returned.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<RetrievalResult, IndexValidationError> {
        if query.len() != self.dimension {
            return Err(IndexValidationError::QueryDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.distance(&entry.vector, query)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| compare_distance(a.1, b.1));
        scored.truncate(k);

        let items = scored
            .into_iter()
            .map(|(i, distance)| RetrievedChunk::new(self.entries[i].chunk.clone(), distance))
            .collect();

        Ok(RetrievalResult::new(items))
    }
}

/// NaN distances sort after every real distance
fn compare_distance(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}
