mod app_config;

pub use app_config::{
    AppConfig, EmbeddingSettings, GenerationSettings, HttpSettings, LogFormat, LoggingConfig,
    RagSettings, OPENAI_API_KEY_VAR,
};
