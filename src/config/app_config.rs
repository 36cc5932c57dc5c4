use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::{ChunkingConfig, DistanceMetric, RagError, TemplateVersion};
use crate::infrastructure::embedding::DEFAULT_OPENAI_BASE_URL;
use crate::infrastructure::services::{
    PipelineOptions, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_K,
};

/// Environment variable consulted when no API key is configured
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub http: HttpSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub source_dir: PathBuf,
    pub index_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub distance_metric: DistanceMetric,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Transport timeout for remote calls; unset means no timeout
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for RagSettings {
    fn default() -> Self {
        let chunking = ChunkingConfig::default();

        Self {
            source_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("vectorstore"),
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            top_k: DEFAULT_TOP_K,
            distance_metric: DistanceMetric::default(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            batch_size: 64,
            concurrency: 4,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl RagSettings {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.chunk_size, self.chunk_overlap)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        self.chunking().validate()?;

        if self.top_k == 0 {
            return Err(RagError::configuration("rag.top_k must be at least 1"));
        }

        Ok(())
    }
}

/// Explicit key, else the `OPENAI_API_KEY` value passed in
fn resolve_key(explicit: Option<&str>, fallback: Option<String>) -> Option<String> {
    explicit
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or(fallback)
        .filter(|k| !k.trim().is_empty())
}

impl EmbeddingSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), std::env::var(OPENAI_API_KEY_VAR).ok())
    }
}

impl GenerationSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), std::env::var(OPENAI_API_KEY_VAR).ok())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            embedding_model: self.embedding.model.clone(),
            embedding_batch_size: self.embedding.batch_size,
            embedding_concurrency: self.embedding.concurrency,
            metric: self.rag.distance_metric,
            generation_model: self.generation.model.clone(),
            temperature: self.generation.temperature,
            template: TemplateVersion::default(),
        }
    }

    pub fn validate(&self) -> Result<(), RagError> {
        self.rag.validate()?;
        self.pipeline_options().validate()
    }
}
