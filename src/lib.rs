//! Promtior RAG
//!
//! Retrieval-augmented question answering over a private document set:
//! - Loading plain-text and PDF documents and splitting them into overlapping chunks
//! - Embedding chunks into a persisted vector index
//! - Answering questions from the nearest chunks through a text-generation model

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{Answer, ErrorKind, RagError};
pub use infrastructure::services::{PipelineOptions, QueryEngine, RagPipeline};
