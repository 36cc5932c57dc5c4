//! Chunking strategy trait and types

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::{Document, DocumentFormat};
use crate::domain::RagError;

/// Default maximum chunk length in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Configuration for chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a new chunking configuration
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::configuration("chunk_size must be greater than 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::configuration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

/// A bounded window of text cut from a [`Document`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    text: String,
    source: String,
    /// Character offset of the chunk start within the source text
    offset: usize,
    format: DocumentFormat,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        offset: usize,
        format: DocumentFormat,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            offset,
            format,
        }
    }

    /// Create a chunk that inherits the source of its parent document
    pub fn from_document(document: &Document, text: impl Into<String>, offset: usize) -> Self {
        Self::new(text, document.source(), offset, document.format())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Length in characters, the unit `chunk_size` is measured in
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Trait for chunking strategies
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split one document into chunks
    fn chunk(&self, document: &Document, config: &ChunkingConfig) -> Result<Vec<Chunk>, RagError>;

    /// Get the strategy name
    fn name(&self) -> &'static str;

    /// Split a sequence of documents, preserving document order
    fn chunk_all(
        &self,
        documents: &[Document],
        config: &ChunkingConfig,
    ) -> Result<Vec<Chunk>, RagError> {
        config.validate()?;

        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(self.chunk(document, config)?);
        }

        Ok(chunks)
    }
}
