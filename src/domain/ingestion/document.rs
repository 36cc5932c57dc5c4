//! Loaded source documents

use serde::{Deserialize, Serialize};

/// Where the text of a document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentFormat {
    /// A whole plain text file
    Plain,
    /// A single page of a PDF file (0-based)
    PdfPage { page: u32 },
}

/// A document read from the source directory
///
/// Documents are immutable once loaded; the chunker only borrows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    source: String,
    format: DocumentFormat,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            format,
        }
    }

    /// Create a plain text document
    pub fn plain(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(text, source, DocumentFormat::Plain)
    }

    /// Create a document for one PDF page
    pub fn pdf_page(text: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        Self::new(text, source, DocumentFormat::PdfPage { page })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}
