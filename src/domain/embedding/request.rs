//! Embedding request types

use serde::{Deserialize, Serialize};

/// Texts to embed with one model
///
/// Texts keep their order; the response refers back to them by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    texts: Vec<String>,
}

impl EmbeddingRequest {
    /// Request for one query text
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::batch(model, vec![text.into()])
    }

    pub fn batch(model: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            model: model.into(),
            texts,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_is_a_batch_of_one() {
        let request = EmbeddingRequest::single("text-embedding-3-small", "What is Promtior?");

        assert_eq!(request.len(), 1);
        assert_eq!(request.texts(), ["What is Promtior?".to_string()]);
    }

    #[test]
    fn test_batch_keeps_order() {
        let request = EmbeddingRequest::batch(
            "text-embedding-3-small",
            vec!["founded".into(), "services".into()],
        );

        assert_eq!(request.model(), "text-embedding-3-small");
        assert_eq!(request.texts(), ["founded".to_string(), "services".to_string()]);
        assert!(EmbeddingRequest::batch("m", Vec::new()).is_empty());
    }
}
