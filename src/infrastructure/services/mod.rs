//! Pipeline services composed from the domain capabilities

mod generator;
mod indexer;
mod rag_pipeline;
mod retriever;

pub use generator::{GenerationInvoker, DEFAULT_GENERATION_MODEL, DEFAULT_TEMPERATURE};
pub use indexer::Indexer;
pub use rag_pipeline::{
    PipelineOptions, QueryEngine, RagPipeline, RagPipelineBuilder, DEFAULT_EMBEDDING_MODEL,
};
pub use retriever::{Retriever, DEFAULT_TOP_K};
