//! Plain text document parser

use async_trait::async_trait;

use crate::domain::ingestion::{Document, DocumentParser, ParserInput};
use crate::domain::RagError;

/// Parser for UTF-8 plain text files; each file becomes one document
#[derive(Debug, Clone, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    /// Create a new plain text parser
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    fn supported_extensions(&self) -> &[&str] {
        &["txt", "text"]
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }

    async fn parse(&self, input: ParserInput) -> Result<Vec<Document>, RagError> {
        let content = input.as_text()?;

        Ok(vec![Document::plain(content, input.source.clone())])
    }
}
