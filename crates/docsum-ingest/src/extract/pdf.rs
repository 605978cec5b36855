//! PDF text extraction.

use super::{clean_text, ExtractedText, Extractor};
use crate::error::{IngestError, IngestResult};
use docsum_core::{Document, DocumentFormat};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Extractor for PDF files.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, document: &Document) -> IngestResult<ExtractedText> {
        let parse_error = |message: String| IngestError::Parse {
            path: document.path.clone(),
            message,
        };

        // pdf-extract panics on some malformed fonts.
        let raw = match catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&document.bytes)
        })) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(parse_error(format!("Failed to extract text from PDF: {}", e)));
            }
            Err(_) => {
                warn!("PDF extraction panicked for {}", document.display_name());
                return Err(parse_error("PDF extraction panicked on malformed content".to_string()));
            }
        };

        let pages = raw.matches('\x0C').count().max(1);
        let content = clean_text(&raw.replace('\x0C', "\n\n"));
        let length = content.chars().count();

        debug!(
            "Extracted {} characters from {} ({} pages)",
            length,
            document.display_name(),
            pages
        );

        let title = document
            .path
            .file_stem()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string());

        let metadata = serde_json::json!({
            "format": "pdf",
            "length": length,
            "pages": pages,
        });

        let mut text = ExtractedText::new(content).with_metadata(metadata);
        if let Some(t) = title {
            text = text.with_title(t);
        }
        Ok(text)
    }
}
