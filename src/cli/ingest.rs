//! Ingest command - builds the index from the source directory

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::config::AppConfig;

/// Arguments for the ingest command
#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    /// Directory holding the source documents (overrides config)
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Index location (overrides config)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Maximum chunk length in characters (overrides config)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters (overrides config)
    #[arg(long)]
    pub chunk_overlap: Option<usize>,
}

impl IngestArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.source_dir {
            config.rag.source_dir = dir.clone();
        }
        if let Some(dir) = &self.index_dir {
            config.rag.index_dir = dir.clone();
        }
        if let Some(size) = self.chunk_size {
            config.rag.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.rag.chunk_overlap = overlap;
        }
    }
}

/// Run the ingest command
pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    args.apply(&mut config);

    let pipeline = super::build_pipeline(&config)?;

    info!(
        source_dir = %config.rag.source_dir.display(),
        index_dir = %config.rag.index_dir.display(),
        "Building index"
    );

    let manifest = pipeline
        .build_index(
            &config.rag.source_dir,
            &config.rag.index_dir,
            config.rag.chunking(),
        )
        .await?;

    println!(
        "Indexed {} chunks ({} dimensions, {}) into {}",
        manifest.entry_count,
        manifest.dimension,
        manifest.embedding_model,
        config.rag.index_dir.display()
    );

    Ok(())
}
