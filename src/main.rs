use clap::Parser;
use promtior_rag::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => cli::ingest::run(args).await,
        Command::Ask(args) => cli::ask::run(args).await,
    }
}
