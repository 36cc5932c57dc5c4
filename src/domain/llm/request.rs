use serde::{Deserialize, Serialize};

use super::Message;

/// Messages plus sampling parameters for one chat completion
///
/// The model is chosen by the caller of [`super::LlmProvider::chat`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn builder() -> LlmRequestBuilder {
        LlmRequestBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct LlmRequestBuilder {
    messages: Vec<Message>,
    temperature: Option<f32>,
}

impl LlmRequestBuilder {
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.message(Message::user(content))
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn build(self) -> LlmRequest {
        LlmRequest {
            messages: self.messages,
            temperature: self.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MessageRole;

    #[test]
    fn test_builder_keeps_message_order() {
        let request = LlmRequest::builder()
            .message(Message::assistant("Promtior is an AI consultancy."))
            .user("Who founded Promtior?")
            .temperature(0.7)
            .build();

        let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::Assistant, MessageRole::User]);
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn test_unset_parameters_are_omitted() {
        let json = serde_json::to_value(LlmRequest::builder().user("Hi").build()).unwrap();

        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
