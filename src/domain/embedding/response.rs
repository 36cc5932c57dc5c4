//! Embedding response types

use serde::{Deserialize, Serialize};

/// One vector of a batch, tagged with the position of its input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, embedding: Vec<f32>) -> Self {
        Self { index, embedding }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn into_vector(self) -> Vec<f32> {
        self.embedding
    }
}

/// Tokens billed for an embedding call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    total_tokens: u32,
}

impl EmbeddingUsage {
    pub fn new(total_tokens: u32) -> Self {
        Self { total_tokens }
    }

    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }
}

/// Vectors returned for one [`super::EmbeddingRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    data: Vec<Embedding>,
    usage: EmbeddingUsage,
}

impl EmbeddingResponse {
    pub fn new(data: Vec<Embedding>, usage: EmbeddingUsage) -> Self {
        Self { data, usage }
    }

    pub fn usage(&self) -> EmbeddingUsage {
        self.usage
    }

    /// Return the vectors in input order, checking that exactly one vector
    /// was produced per input
    ///
    /// Providers may return batch items out of order; each item carries the
    /// position of the input it belongs to.
    pub fn into_ordered_vectors(self, expected: usize) -> Result<Vec<Vec<f32>>, String> {
        if self.data.len() != expected {
            return Err(format!(
                "expected {} embeddings, received {}",
                expected,
                self.data.len()
            ));
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
        for embedding in self.data {
            let index = embedding.index();
            let Some(slot) = slots.get_mut(index) else {
                return Err(format!("embedding index {} out of range", index));
            };

            if slot.is_some() {
                return Err(format!("duplicate embedding index {}", index));
            }

            *slot = Some(embedding.into_vector());
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| format!("missing embedding for input {}", i)))
            .collect()
    }
}
