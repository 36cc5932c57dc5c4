//! OpenAI embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};
use crate::domain::RagError;
use crate::infrastructure::http_client::{HttpClientTrait, HttpError};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const PROVIDER_NAME: &str = "openai";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

/// OpenAI embedding provider
pub struct OpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> std::fmt::Debug for OpenAiEmbeddingProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClientTrait> OpenAiEmbeddingProvider<C> {
    /// Create a new OpenAI embedding provider
    pub fn new(client: C, api_key: impl Into<String>) -> Result<Self, RagError> {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a new provider with custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RagError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::configuration(
                "An OpenAI API key is required for embeddings (set OPENAI_API_KEY)",
            ));
        }

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", api_key),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model(),
            "input": request.texts(),
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<EmbeddingResponse, RagError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            RagError::embedding(
                PROVIDER_NAME,
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        let embeddings: Vec<Embedding> = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        let usage = EmbeddingUsage::new(response.usage.total_tokens);

        Ok(EmbeddingResponse::new(embeddings, usage))
    }
}

fn map_http_error(error: HttpError) -> RagError {
    RagError::embedding(PROVIDER_NAME, error.to_string())
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OpenAiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, RagError> {
        let url = self.embeddings_url();
        let body = self.build_request(&request);

        tracing::debug!(
            model = request.model(),
            inputs = request.len(),
            "Requesting embeddings"
        );

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(map_http_error)?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn dimensions(&self, model: &str) -> Option<usize> {
        EMBEDDING_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, dims)| *dims)
    }
}

// OpenAI API types for embeddings

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
    #[serde(default)]
    usage: OpenAiEmbeddingUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiEmbeddingUsage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use crate::infrastructure::http_client::HttpClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn create_mock_response(num_embeddings: usize, dimensions: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..num_embeddings)
            .map(|i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i + j) as f32 * 0.001).collect();
                serde_json::json!({
                    "index": i,
                    "embedding": embedding,
                    "object": "embedding"
                })
            })
            .collect();

        serde_json::json!({
            "model": "text-embedding-3-small",
            "data": data,
            "usage": {
                "prompt_tokens": 10,
                "total_tokens": 10
            }
        })
    }

    #[tokio::test]
    async fn test_embed_single_text() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1, 1536));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key").unwrap();

        let request = EmbeddingRequest::single("text-embedding-3-small", "Hello world");
        let response = provider.embed(request).await.unwrap();

        assert_eq!(response.usage().total_tokens(), 10);
        let vectors = response.into_ordered_vectors(1).unwrap();
        assert_eq!(vectors[0].len(), 1536);
    }

    #[tokio::test]
    async fn test_embed_batch_sends_all_inputs() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(3, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key").unwrap();

        let request = EmbeddingRequest::batch(
            "text-embedding-3-small",
            vec!["Hello".into(), "World".into(), "Test".into()],
        );
        let response = provider.embed(request).await.unwrap();

        assert_eq!(response.into_ordered_vectors(3).unwrap().len(), 3);
        assert_eq!(
            provider.client.requests()[0]["input"],
            serde_json::json!(["Hello", "World", "Test"])
        );
    }

    #[tokio::test]
    async fn test_http_error_becomes_embedding_service_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, HttpError::Timeout);
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key").unwrap();

        let result = provider
            .embed(EmbeddingRequest::single("text-embedding-3-small", "Hello"))
            .await;

        assert!(matches!(result, Err(RagError::EmbeddingService { .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_embedding_service_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"oops": 1}));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key").unwrap();

        let result = provider
            .embed(EmbeddingRequest::single("text-embedding-3-small", "Hello"))
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse embedding response"));
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let result = OpenAiEmbeddingProvider::new(MockHttpClient::new(), "  ");
        assert!(matches!(result, Err(RagError::Configuration { .. })));
    }

    #[test]
    fn test_provider_info() {
        let provider = OpenAiEmbeddingProvider::new(MockHttpClient::new(), "test-key").unwrap();

        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.dimensions("text-embedding-3-small"), Some(1536));
        assert_eq!(provider.dimensions("text-embedding-3-large"), Some(3072));
        assert_eq!(provider.dimensions("unknown-model"), None);
        assert!(!format!("{:?}", provider).contains("test-key"));
    }

    #[tokio::test]
    async fn test_against_http_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_mock_response(2, 3)))
            .mount(&server)
            .await;

        let provider =
            OpenAiEmbeddingProvider::with_base_url(HttpClient::new(), "sk-test", server.uri())
                .unwrap();
        let response = provider
            .embed(EmbeddingRequest::batch(
                "text-embedding-3-small",
                vec!["a".into(), "b".into()],
            ))
            .await
            .unwrap();

        assert_eq!(response.into_ordered_vectors(2).unwrap().len(), 2);
    }
}
