//! Directory document loader

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::ingestion::{Document, DocumentParser, ParserInput};
use crate::domain::RagError;

use super::parsers::{PdfParser, PlainTextParser};

/// Loads every supported file directly inside a source directory
///
/// Files are visited in sorted path order. Subdirectories are not descended
/// into, and files no parser claims are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    parsers: Vec<Arc<dyn DocumentParser>>,
}

impl DirectoryLoader {
    /// Loader for plain text and PDF files
    pub fn new() -> Self {
        Self::with_parsers(vec![
            Arc::new(PlainTextParser::new()),
            Arc::new(PdfParser::new()),
        ])
    }

    pub fn with_parsers(parsers: Vec<Arc<dyn DocumentParser>>) -> Self {
        Self { parsers }
    }

    fn parser_for(&self, path: &Path) -> Option<&Arc<dyn DocumentParser>> {
        self.parsers.iter().find(|p| p.supports_file(path))
    }

    pub async fn load(&self, source_dir: &Path) -> Result<Vec<Document>, RagError> {
        let files = list_files(source_dir).await?;

        let mut documents = Vec::new();
        let mut supported = 0usize;

        for path in files {
            let Some(parser) = self.parser_for(&path) else {
                tracing::debug!(path = %path.display(), "Skipping unsupported file");
                continue;
            };
            supported += 1;

            let source = path.display().to_string();
            let content = tokio::fs::read(&path)
                .await
                .map_err(|e| RagError::document_load(&source, e.to_string()))?;

            let parsed = parser.parse(ParserInput::new(source.clone(), content)).await?;
            tracing::debug!(
                source = %source,
                parser = parser.name(),
                documents = parsed.len(),
                "Loaded file"
            );
            documents.extend(parsed);
        }

        if supported == 0 {
            return Err(RagError::empty_corpus(format!(
                "No supported documents found in '{}'",
                source_dir.display()
            )));
        }

        tracing::info!(
            source_dir = %source_dir.display(),
            files = supported,
            documents = documents.len(),
            "Loaded documents"
        );

        Ok(documents)
    }
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Regular files directly inside `dir`, sorted by path
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, RagError> {
    let metadata = tokio::fs::metadata(dir).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RagError::configuration(format!(
                "Source directory '{}' does not exist",
                dir.display()
            ))
        } else {
            RagError::configuration(format!(
                "Cannot access source directory '{}': {}",
                dir.display(),
                e
            ))
        }
    })?;

    if !metadata.is_dir() {
        return Err(RagError::configuration(format!(
            "Source path '{}' is not a directory",
            dir.display()
        )));
    }

    let read_error = |e: std::io::Error| {
        RagError::configuration(format!(
            "Cannot read source directory '{}': {}",
            dir.display(),
            e
        ))
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        if is_file {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
