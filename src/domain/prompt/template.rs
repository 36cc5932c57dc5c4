//! Prompt template parsing and rendering
//!
//! Variables are written `${var:variable-name}` and every one must be given
//! a value at render time.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// Regex to match variable patterns: ${var:name}
static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{var:([a-zA-Z0-9][-a-zA-Z0-9]*)\}").expect("variable pattern is a valid regex")
});

/// Template processing errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Missing required variable: {name}")]
    MissingVariable { name: String },
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    content: String,
    /// Variable names, in order of first appearance
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template string and extract variables
    pub fn parse(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut variables = Vec::new();
        let mut seen_names = HashSet::new();

        for cap in VARIABLE_PATTERN.captures_iter(&content) {
            let name = cap[1].to_string();
            if seen_names.insert(name.clone()) {
                variables.push(name);
            }
        }

        Self { content, variables }
    }

    /// Render the template with provided values
    ///
    /// Substitution happens in a single pass over the template, so a value
    /// that itself contains `${var:...}` text is inserted verbatim.
    pub fn render(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|name| !values.contains_key(name.as_str()))
        {
            return Err(TemplateError::MissingVariable {
                name: missing.clone(),
            });
        }

        let rendered = VARIABLE_PATTERN.replace_all(&self.content, |caps: &Captures| {
            values
                .get(&caps[1])
                .map(|value| (*value).to_string())
                .unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_variables() {
        let template = PromptTemplate::parse("Hello, world!");
        assert_eq!(template.render(&HashMap::new()).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_render_repeated_variable() {
        let template = PromptTemplate::parse("${var:name} and ${var:name} again");
        let values = HashMap::from([("name", "Alice")]);

        assert_eq!(template.render(&values).unwrap(), "Alice and Alice again");
    }

    #[test]
    fn test_render_missing_variable() {
        let template = PromptTemplate::parse("Hello, ${var:name}!");

        assert_eq!(
            template.render(&HashMap::new()),
            Err(TemplateError::MissingVariable {
                name: "name".to_string()
            })
        );
    }

    #[test]
    fn test_render_does_not_expand_placeholders_inside_values() {
        let template = PromptTemplate::parse("C: ${var:context} Q: ${var:question}");
        let values = HashMap::from([("context", "see ${var:question}"), ("question", "why?")]);

        assert_eq!(
            template.render(&values).unwrap(),
            "C: see ${var:question} Q: why?"
        );
    }

    #[test]
    fn test_variable_name_with_hyphens() {
        let template = PromptTemplate::parse("${var:user-name} uses ${var:api-key}");
        let values = HashMap::from([("user-name", "alice"), ("api-key", "k")]);

        assert_eq!(template.render(&values).unwrap(), "alice uses k");
    }

    #[test]
    fn test_text_after_colon_is_not_a_variable() {
        let template = PromptTemplate::parse("${var:name:World}");

        assert_eq!(template.render(&HashMap::new()).unwrap(), "${var:name:World}");
    }
}
