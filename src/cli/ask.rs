//! Ask command - answers one question from a built index

use std::path::PathBuf;

use clap::Args;

use crate::domain::Answer;

/// Arguments for the ask command
#[derive(Args, Clone, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Index location (overrides config)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Number of chunks to retrieve (overrides config)
    #[arg(short)]
    pub k: Option<usize>,

    /// Print the answer as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the ask command
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    if let Some(dir) = &args.index_dir {
        config.rag.index_dir = dir.clone();
    }
    if let Some(k) = args.k {
        config.rag.top_k = k;
    }

    let pipeline = super::build_pipeline(&config)?;

    let answer = pipeline
        .answer_question(&config.rag.index_dir, &args.question, config.rag.top_k)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", render(&answer));
    }

    Ok(())
}

fn render(answer: &Answer) -> String {
    let mut out = answer.answer.trim_end().to_string();

    if !answer.sources.is_empty() {
        out.push_str("\n\nSources:");
        for (rank, source) in answer.sources.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", rank + 1, source));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TemplateVersion;

    #[test]
    fn test_render_lists_sources_in_rank_order() {
        let answer = Answer {
            answer: "Promtior was founded in 2023.\n".to_string(),
            sources: vec!["data/about.txt".to_string(), "data/deck.pdf".to_string()],
            prompt_version: TemplateVersion::V1,
        };

        assert_eq!(
            render(&answer),
            "Promtior was founded in 2023.\n\nSources:\n  1. data/about.txt\n  2. data/deck.pdf"
        );
    }

    #[test]
    fn test_render_without_sources() {
        let answer = Answer {
            answer: "I don't know.".to_string(),
            sources: Vec::new(),
            prompt_version: TemplateVersion::V1,
        };

        assert_eq!(render(&answer), "I don't know.");
    }
}
