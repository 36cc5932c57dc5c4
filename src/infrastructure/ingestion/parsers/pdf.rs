//! PDF document parser

use async_trait::async_trait;

use crate::domain::ingestion::{Document, DocumentParser, ParserInput};
use crate::domain::RagError;

/// Parser for PDF files; each page becomes one document
///
/// Page numbers recorded on documents are 0-based.
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

fn extract_pages(source: &str, content: &[u8]) -> Result<Vec<Document>, RagError> {
    let pdf = lopdf::Document::load_mem(content)
        .map_err(|e| RagError::document_load(source, format!("Invalid PDF: {}", e)))?;

    // get_pages is keyed by 1-based page number, in page order
    let documents = pdf
        .get_pages()
        .into_keys()
        .map(|number| page_document(source, number, pdf.extract_text(&[number])))
        .collect();

    Ok(documents)
}

/// A page whose text cannot be extracted still counts as a page, with no text
fn page_document<E: std::fmt::Display>(
    source: &str,
    number: u32,
    extracted: Result<String, E>,
) -> Document {
    let text = extracted.unwrap_or_else(|e| {
        tracing::warn!(source, page = number, error = %e, "No text extracted from PDF page");
        String::new()
    });

    Document::pdf_page(text, source, number - 1)
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn parse(&self, input: ParserInput) -> Result<Vec<Document>, RagError> {
        let ParserInput { source, content } = input;
        let task_source = source.clone();

        let documents =
            tokio::task::spawn_blocking(move || extract_pages(&task_source, &content))
                .await
                .map_err(|e| RagError::document_load(&source, format!("PDF task failed: {}", e)))??;

        tracing::debug!(source = %source, pages = documents.len(), "Parsed PDF");

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::DocumentFormat;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::path::Path;

    /// Build a PDF with one text line per page
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_one_document_per_page() {
        let parser = PdfParser::new();
        let bytes = pdf_with_pages(&["Promtior first page", "Second page here"]);

        let documents = parser
            .parse(ParserInput::new("data/about.pdf", bytes))
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].format(), DocumentFormat::PdfPage { page: 0 });
        assert_eq!(documents[1].format(), DocumentFormat::PdfPage { page: 1 });
        assert!(documents[0].text().contains("Promtior"));
        assert!(documents[1].text().contains("Second"));
        assert!(documents.iter().all(|d| d.source() == "data/about.pdf"));
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_document_load_error() {
        let parser = PdfParser::new();

        let result = parser
            .parse(ParserInput::new("broken.pdf", b"not a pdf".to_vec()))
            .await;

        assert!(matches!(result, Err(RagError::DocumentLoad { .. })));
    }

    #[test]
    fn test_unextractable_page_becomes_empty_document() {
        let document = page_document("data/deck.pdf", 3, Err::<String, _>("bad font encoding"));

        assert_eq!(document.text(), "");
        assert_eq!(document.format(), DocumentFormat::PdfPage { page: 2 });
        assert_eq!(document.source(), "data/deck.pdf");
    }

    #[test]
    fn test_supports_file() {
        let parser = PdfParser::new();
        assert!(parser.supports_file(Path::new("report.pdf")));
        assert!(parser.supports_file(Path::new("REPORT.PDF")));
        assert!(!parser.supports_file(Path::new("report.txt")));
    }
}
