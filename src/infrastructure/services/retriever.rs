//! Query-time nearest neighbour retrieval

use std::sync::Arc;

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::{EmbeddingVector, Index, RagError, RetrievalResult};

/// Default number of chunks retrieved per query
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds queries and ranks index entries against them
#[derive(Debug, Clone)]
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
}

impl Retriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Embed the query with the same model the index was built with
    pub async fn embed_query(&self, index: &Index, query: &str) -> Result<EmbeddingVector, RagError> {
        if index.embedding_model() != self.model {
            return Err(RagError::retrieval(format!(
                "Index was built with '{}' but queries are embedded with '{}'",
                index.embedding_model(),
                self.model
            )));
        }

        let response = self
            .provider
            .embed(EmbeddingRequest::single(&self.model, query))
            .await
            .map_err(|e| RagError::retrieval(format!("Query embedding failed: {}", e)))?;

        let vector = response
            .into_ordered_vectors(1)
            .map_err(|message| RagError::retrieval(format!("Query embedding failed: {}", message)))?
            .pop()
            .ok_or_else(|| RagError::retrieval("Query embedding failed: no vector returned"))?;

        Ok(vector)
    }

    /// Rank every entry by distance to `query_vector` and keep the nearest `k`
    pub fn rank(
        &self,
        index: &Index,
        query_vector: &[f32],
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        if k == 0 {
            return Err(RagError::configuration("k must be at least 1"));
        }

        let result = index
            .nearest(query_vector, k)
            .map_err(|e| RagError::retrieval(e.to_string()))?;

        tracing::debug!(k, retrieved = result.len(), "Ranked index entries");

        Ok(result)
    }

    pub async fn retrieve(
        &self,
        index: &Index,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        if k == 0 {
            return Err(RagError::configuration("k must be at least 1"));
        }

        let vector = self.embed_query(index, query).await?;
        self.rank(index, &vector, k)
    }
}
