//! Prompt rendering - versioned templates with variable support

mod composer;
mod template;

pub use composer::{CONTEXT_SEPARATOR, Prompt, PromptComposer, TemplateVersion};
pub use template::{PromptTemplate, TemplateError};
