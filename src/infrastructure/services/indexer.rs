//! Embeds chunks and assembles them into an index

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::{Chunk, DistanceMetric, EmbeddingVector, Index, IndexEntry, RagError};

/// Turns chunks into an [`Index`] through the embedding capability
///
/// Chunk texts are sent in batches of `batch_size`, with up to `concurrency`
/// batches in flight. Vectors are matched back to chunks by position, so the
/// order batches complete in never changes which vector a chunk gets.
#[derive(Debug, Clone)]
pub struct Indexer {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    metric: DistanceMetric,
    batch_size: usize,
    concurrency: usize,
}

impl Indexer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            metric: DistanceMetric::default(),
            batch_size: 64,
            concurrency: 4,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    fn embedding_error(&self, message: impl Into<String>) -> RagError {
        RagError::embedding(self.provider.provider_name(), message)
    }

    /// Vectors in input order plus the tokens the batch cost
    async fn embed_batch(&self, texts: Vec<String>) -> Result<(Vec<EmbeddingVector>, u32), RagError> {
        let expected = texts.len();
        let response = self
            .provider
            .embed(EmbeddingRequest::batch(&self.model, texts))
            .await?;
        let tokens = response.usage().total_tokens();

        let vectors = response
            .into_ordered_vectors(expected)
            .map_err(|message| self.embedding_error(message))?;

        Ok((vectors, tokens))
    }

    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<Index, RagError> {
        if chunks.is_empty() {
            return Err(RagError::empty_corpus(
                "Documents produced no chunks to index",
            ));
        }

        let batches: Vec<Vec<String>> = chunks
            .chunks(self.batch_size)
            .map(|batch| batch.iter().map(|c| c.text().to_string()).collect())
            .collect();

        tracing::info!(
            chunk_count = chunks.len(),
            batches = batches.len(),
            model = %self.model,
            "Embedding chunks"
        );

        let embedded = stream::iter(batches)
            .map(|batch| self.embed_batch(batch))
            .buffered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        let mut total_tokens: u64 = 0;
        let mut vectors: Vec<EmbeddingVector> = Vec::with_capacity(chunks.len());
        for (batch_vectors, tokens) in embedded {
            total_tokens += u64::from(tokens);
            vectors.extend(batch_vectors);
        }

        if vectors.len() != chunks.len() {
            return Err(self.embedding_error(format!(
                "expected {} embeddings, received {}",
                chunks.len(),
                vectors.len()
            )));
        }

        if let (Some(expected), Some(first)) = (self.provider.dimensions(&self.model), vectors.first()) {
            if first.len() != expected {
                return Err(self.embedding_error(format!(
                    "model '{}' should produce {} dimensions, received {}",
                    self.model,
                    expected,
                    first.len()
                )));
            }
        }

        let entries = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| IndexEntry::new(vector, chunk))
            .collect();

        let index = Index::new(&self.model, self.metric, entries)
            .map_err(|e| self.embedding_error(e.to_string()))?;

        tracing::info!(
            entry_count = index.len(),
            dimension = index.dimension(),
            total_tokens,
            "Built index"
        );

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::DocumentFormat;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .map(|t| Chunk::new(*t, "doc.txt", 0, DocumentFormat::Plain))
            .collect()
    }

    #[tokio::test]
    async fn test_vectors_follow_chunk_order_across_batches() {
        let provider = Arc::new(
            MockEmbeddingProvider::new("mock", 2)
                .with_vector("a", vec![1.0, 0.0])
                .with_vector("b", vec![0.0, 1.0])
                .with_vector("c", vec![1.0, 1.0]),
        );
        let indexer = Indexer::new(provider.clone(), "mock-embedding")
            .with_batch_size(2)
            .with_concurrency(2);

        let index = indexer.build(chunks(&["a", "b", "c"])).await.unwrap();

        let pairs: Vec<(&str, &[f32])> = index
            .entries()
            .iter()
            .map(|e| (e.chunk.text(), e.vector.as_slice()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a", &[1.0, 0.0][..]),
                ("b", &[0.0, 1.0][..]),
                ("c", &[1.0, 1.0][..]),
            ]
        );
        assert_eq!(provider.calls(), 2);
        assert_eq!(index.embedding_model(), "mock-embedding");
    }

    #[tokio::test]
    async fn test_no_chunks_is_empty_corpus() {
        let indexer = Indexer::new(Arc::new(MockEmbeddingProvider::new("mock", 2)), "m");

        let result = indexer.build(Vec::new()).await;

        assert!(matches!(result, Err(RagError::EmptyCorpus { .. })));
    }

    #[tokio::test]
    async fn test_count_mismatch_is_embedding_error() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 2).dropping_last());
        let indexer = Indexer::new(provider, "m");

        let result = indexer.build(chunks(&["a", "b"])).await;

        assert!(matches!(result, Err(RagError::EmbeddingService { .. })));
    }

    #[tokio::test]
    async fn test_provider_failure_is_embedding_error() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 2).with_error("unavailable"));
        let indexer = Indexer::new(provider, "m");

        let result = indexer.build(chunks(&["a"])).await;

        assert!(matches!(result, Err(RagError::EmbeddingService { .. })));
    }

    #[tokio::test]
    async fn test_unexpected_dimension_is_embedding_error() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 3).with_vector("a", vec![1.0]));
        let indexer = Indexer::new(provider, "m");

        let result = indexer.build(chunks(&["a"])).await;

        assert!(matches!(result, Err(RagError::EmbeddingService { .. })));
    }

    #[tokio::test]
    async fn test_metric_is_recorded_on_index() {
        let indexer = Indexer::new(Arc::new(MockEmbeddingProvider::new("mock", 4)), "m")
            .with_metric(DistanceMetric::Cosine);

        let index = indexer.build(chunks(&["a"])).await.unwrap();

        assert_eq!(index.metric(), DistanceMetric::Cosine);
    }
}
