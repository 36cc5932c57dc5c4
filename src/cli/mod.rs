//! CLI module for promtior-rag
//!
//! - `ingest`: build the index from the source directory
//! - `ask`: answer one question from a built index

pub mod ask;
pub mod ingest;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::embedding::OpenAiEmbeddingProvider;
use crate::infrastructure::llm::OpenAiProvider;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::services::RagPipeline;
use crate::infrastructure::HttpClient;

/// Promtior RAG - answer questions about Promtior from its own documents
#[derive(Parser)]
#[command(name = "promtior-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load, chunk and embed the source documents into an index
    Ingest(ingest::IngestArgs),

    /// Answer a question from a built index
    Ask(ask::AskArgs),
}

/// `.env`, config files and environment, then logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    Ok(config)
}

/// Pipeline wired to the OpenAI embedding and chat endpoints
fn build_pipeline(config: &AppConfig) -> anyhow::Result<RagPipeline> {
    config.validate()?;

    let client = HttpClient::from_timeout_secs(config.http.timeout_secs)?;

    let embedding = OpenAiEmbeddingProvider::with_base_url(
        client.clone(),
        config.embedding.resolved_api_key().unwrap_or_default(),
        &config.embedding.base_url,
    )?;
    let llm = OpenAiProvider::with_base_url(
        client,
        config.generation.resolved_api_key().unwrap_or_default(),
        &config.generation.base_url,
    )?;

    let pipeline = RagPipeline::builder()
        .options(config.pipeline_options())
        .embedding_provider(Arc::new(embedding))
        .llm_provider(Arc::new(llm))
        .build()?;

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_parses_question_and_k() {
        let cli = Cli::try_parse_from(["promtior-rag", "ask", "When was Promtior founded?", "-k", "2"])
            .unwrap();

        match cli.command {
            Command::Ask(args) => {
                assert_eq!(args.question, "When was Promtior founded?");
                assert_eq!(args.k, Some(2));
                assert!(args.index_dir.is_none());
            }
            Command::Ingest(_) => panic!("expected ask"),
        }
    }

    #[test]
    fn test_ingest_parses_overrides() {
        let cli = Cli::try_parse_from([
            "promtior-rag",
            "ingest",
            "--source-dir",
            "docs",
            "--chunk-size",
            "500",
        ])
        .unwrap();

        match cli.command {
            Command::Ingest(args) => {
                assert_eq!(args.source_dir, Some("docs".into()));
                assert_eq!(args.chunk_size, Some(500));
                assert_eq!(args.chunk_overlap, None);
            }
            Command::Ask(_) => panic!("expected ingest"),
        }
    }
}
