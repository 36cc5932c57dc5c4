//! Renders retrieved context and a question into a single prompt

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::template::{PromptTemplate, TemplateError};
use crate::domain::retrieval::RetrievalResult;

/// Separator placed between chunk texts in the context section
pub const CONTEXT_SEPARATOR: &str = "\n\n";

const TEMPLATE_V1: &str = "You are a helpful assistant for Promtior, an AI consulting company founded in May 2023.
Use the following context to answer the user's question about Promtior.
If you don't know the answer based on the context, say so politely.
Always be professional and informative.

Context:
${var:context}

Question: ${var:question}

Answer:";

/// Identifies the template a prompt was rendered with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVersion {
    #[default]
    V1,
}

impl TemplateVersion {
    fn source(&self) -> &'static str {
        match self {
            Self::V1 => TEMPLATE_V1,
        }
    }
}

impl fmt::Display for TemplateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
        }
    }
}

/// A rendered prompt, ready to send to the generation capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    version: TemplateVersion,
}

impl Prompt {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> TemplateVersion {
        self.version
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Deterministic prompt renderer for one template version
#[derive(Debug, Clone)]
pub struct PromptComposer {
    version: TemplateVersion,
    template: PromptTemplate,
}

impl PromptComposer {
    pub fn new(version: TemplateVersion) -> Self {
        Self {
            version,
            template: PromptTemplate::parse(version.source()),
        }
    }

    pub fn version(&self) -> TemplateVersion {
        self.version
    }

    /// Render the prompt from retrieved chunks (in rank order) and the
    /// verbatim question
    pub fn compose(
        &self,
        retrieved: &RetrievalResult,
        question: &str,
    ) -> Result<Prompt, TemplateError> {
        let context = retrieved.texts().join(CONTEXT_SEPARATOR);
        let values = HashMap::from([("context", context.as_str()), ("question", question)]);

        Ok(Prompt {
            text: self.template.render(&values)?,
            version: self.version,
        })
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(TemplateVersion::default())
    }
}
