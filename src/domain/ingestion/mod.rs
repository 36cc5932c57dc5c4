//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `Document` and `Chunk`, the values flowing through the build path
//! - `DocumentParser` trait for turning raw files into documents
//! - `ChunkingStrategy` trait for splitting documents into chunks

pub mod chunker;
pub mod document;
pub mod parser;

pub use chunker::{
    Chunk, ChunkingConfig, ChunkingStrategy, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
pub use document::{Document, DocumentFormat};
pub use parser::{DocumentParser, ParserInput};
