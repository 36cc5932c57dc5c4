use async_trait::async_trait;

use super::{LlmRequest, LlmResponse};
use crate::domain::RagError;

#[cfg(test)]
use mockall::automock;

/// Trait for text-generation providers (OpenAI, etc.)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, RagError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
