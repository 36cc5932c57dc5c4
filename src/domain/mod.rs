//! Domain layer - Core RAG types and the capability traits adapters implement

pub mod embedding;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

pub use embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};
pub use error::{ErrorKind, GenerationFailure, RagError};
pub use index::{
    cosine_similarity, DistanceMetric, EmbeddingVector, Index, IndexEntry, IndexValidationError,
};
pub use ingestion::{
    Chunk, ChunkingConfig, ChunkingStrategy, Document, DocumentFormat, DocumentParser,
    ParserInput,
};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use pipeline::{Answer, QueryProgress, QueryStage, StageTransitionError};
pub use prompt::{Prompt, PromptComposer, PromptTemplate, TemplateError, TemplateVersion};
pub use retrieval::{RetrievalResult, RetrievedChunk};
