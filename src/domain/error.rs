use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Why a call to the generation capability failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailure {
    Unavailable,
    Timeout,
    RateLimited,
    Malformed,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate limited",
            Self::Malformed => "malformed response",
        };
        f.write_str(label)
    }
}

/// Stable discriminant of a [`RagError`], for callers that map errors to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    EmptyCorpus,
    DocumentLoad,
    EmbeddingService,
    GenerationService,
    IndexNotFound,
    IndexCorrupt,
    IndexWrite,
    IndexLocked,
    RetrievalService,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::EmptyCorpus => "empty_corpus",
            Self::DocumentLoad => "document_load_error",
            Self::EmbeddingService => "embedding_service_error",
            Self::GenerationService => "generation_service_error",
            Self::IndexNotFound => "index_not_found",
            Self::IndexCorrupt => "index_corrupt",
            Self::IndexWrite => "index_write_error",
            Self::IndexLocked => "index_locked",
            Self::RetrievalService => "retrieval_service_error",
        }
    }

    /// Whether the caller must rebuild the index before querying again
    pub fn requires_rebuild(&self) -> bool {
        matches!(self, Self::IndexNotFound | Self::IndexCorrupt)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the retrieval-augmented generation core
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Empty corpus: {message}")]
    EmptyCorpus { message: String },

    #[error("Failed to load document '{source_id}': {message}")]
    DocumentLoad { source_id: String, message: String },

    #[error("Embedding service error: {provider} - {message}")]
    EmbeddingService { provider: String, message: String },

    #[error("Generation service error ({reason}): {provider} - {message}")]
    GenerationService {
        provider: String,
        reason: GenerationFailure,
        message: String,
    },

    #[error("Index not found at '{location}': {message}")]
    IndexNotFound { location: String, message: String },

    #[error("Index at '{location}' is corrupt: {message}")]
    IndexCorrupt { location: String, message: String },

    #[error("Failed to write index to '{location}': {message}")]
    IndexWrite { location: String, message: String },

    #[error("Index at '{location}' is locked by another build")]
    IndexLocked { location: String },

    #[error("Retrieval service error: {message}")]
    RetrievalService { message: String },
}

impl RagError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn empty_corpus(message: impl Into<String>) -> Self {
        Self::EmptyCorpus {
            message: message.into(),
        }
    }

    pub fn document_load(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentLoad {
            source_id: source.into(),
            message: message.into(),
        }
    }

    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingService {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn generation(
        provider: impl Into<String>,
        reason: GenerationFailure,
        message: impl Into<String>,
    ) -> Self {
        Self::GenerationService {
            provider: provider.into(),
            reason,
            message: message.into(),
        }
    }

    pub fn index_not_found(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexNotFound {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn index_corrupt(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexCorrupt {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn index_write(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexWrite {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn index_locked(location: impl Into<String>) -> Self {
        Self::IndexLocked {
            location: location.into(),
        }
    }

    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::RetrievalService {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::EmptyCorpus { .. } => ErrorKind::EmptyCorpus,
            Self::DocumentLoad { .. } => ErrorKind::DocumentLoad,
            Self::EmbeddingService { .. } => ErrorKind::EmbeddingService,
            Self::GenerationService { .. } => ErrorKind::GenerationService,
            Self::IndexNotFound { .. } => ErrorKind::IndexNotFound,
            Self::IndexCorrupt { .. } => ErrorKind::IndexCorrupt,
            Self::IndexWrite { .. } => ErrorKind::IndexWrite,
            Self::IndexLocked { .. } => ErrorKind::IndexLocked,
            Self::RetrievalService { .. } => ErrorKind::RetrievalService,
        }
    }
}
