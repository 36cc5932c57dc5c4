//! Infrastructure layer - Adapters for files, HTTP services and the pipeline

pub mod embedding;
pub mod http_client;
pub mod index_store;
pub mod ingestion;
pub mod llm;
pub mod logging;
pub mod services;

pub use http_client::{HttpClient, HttpClientTrait, HttpError};
pub use index_store::{BuildLock, IndexManifest, IndexStore};
