//! Sends rendered prompts to the text-generation capability

use std::sync::Arc;

use crate::domain::{LlmProvider, LlmRequest, Prompt, RagError};

pub const DEFAULT_GENERATION_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Invokes one fixed model at one fixed temperature
///
/// Failures are returned as-is; nothing is retried here.
#[derive(Clone)]
pub struct GenerationInvoker {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for GenerationInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationInvoker")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl GenerationInvoker {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generated text for `prompt`, verbatim
    pub async fn generate(&self, prompt: &Prompt) -> Result<String, RagError> {
        let request = LlmRequest::builder()
            .user(prompt.text())
            .temperature(self.temperature)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        let usage = response.usage.clone().unwrap_or_default();
        tracing::debug!(
            model = %self.model,
            finish_reason = ?response.finish_reason,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "Generated answer"
        );

        Ok(response.content().to_string())
    }
}
