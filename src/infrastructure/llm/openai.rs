use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    FinishReason, GenerationFailure, LlmProvider, LlmRequest, LlmResponse, Message, RagError,
    Usage,
};
use crate::infrastructure::embedding::DEFAULT_OPENAI_BASE_URL;
use crate::infrastructure::http_client::{HttpClientTrait, HttpError};

const PROVIDER_NAME: &str = "openai";

/// OpenAI chat completions provider
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> std::fmt::Debug for OpenAiProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Result<Self, RagError> {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RagError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::configuration(
                "An OpenAI API key is required for generation (set OPENAI_API_KEY)",
            ));
        }

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", api_key),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> =
            request.messages.iter().map(OpenAiMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, RagError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            RagError::generation(
                PROVIDER_NAME,
                GenerationFailure::Malformed,
                format!("Failed to parse response: {}", e),
            )
        })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            RagError::generation(
                PROVIDER_NAME,
                GenerationFailure::Malformed,
                "No choices in response",
            )
        })?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        let mut llm_response = LlmResponse::new(response.id, response.model, message);

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(FinishReason::parse(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response =
                llm_response.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(llm_response)
    }
}

fn map_http_error(error: HttpError) -> RagError {
    let reason = match &error {
        HttpError::Timeout => GenerationFailure::Timeout,
        HttpError::RateLimited { .. } => GenerationFailure::RateLimited,
        HttpError::Decode(_) => GenerationFailure::Malformed,
        HttpError::Status { .. } | HttpError::Transport(_) => GenerationFailure::Unavailable,
    };

    RagError::generation(PROVIDER_NAME, reason, error.to_string())
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, RagError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, &request);
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
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

impl OpenAiMessage {
    fn from_domain(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
