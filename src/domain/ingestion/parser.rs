//! Document parser trait and types

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use super::Document;
use crate::domain::RagError;

/// Raw file handed to a parser
#[derive(Debug, Clone)]
pub struct ParserInput {
    /// Source identifier recorded on every produced document (the file path)
    pub source: String,
    /// Raw file bytes
    pub content: Vec<u8>,
}

impl ParserInput {
    pub fn new(source: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }

    /// Decode the content as UTF-8
    pub fn as_text(&self) -> Result<&str, RagError> {
        std::str::from_utf8(&self.content)
            .map_err(|e| RagError::document_load(&self.source, format!("Invalid UTF-8: {}", e)))
    }
}

/// Trait for document parsers
#[async_trait]
pub trait DocumentParser: Send + Sync + Debug {
    /// Get supported file extensions (e.g., ["txt", "text"])
    fn supported_extensions(&self) -> &[&str];

    /// Get the parser name
    fn name(&self) -> &'static str;

    /// Parse a file into one or more documents
    async fn parse(&self, input: ParserInput) -> Result<Vec<Document>, RagError>;

    /// Check if this parser supports a given file path
    fn supports_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };

        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}
