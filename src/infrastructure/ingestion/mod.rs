//! Document ingestion infrastructure
//!
//! This module provides the directory loader, the file parsers it dispatches
//! to, and the chunking strategy used to window loaded documents.

pub mod chunkers;
pub mod loader;
pub mod parsers;

pub use chunkers::RecursiveChunker;
pub use loader::DirectoryLoader;
pub use parsers::{PdfParser, PlainTextParser};
