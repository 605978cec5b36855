//! Text extractors for the supported document formats.

mod html;
mod pdf;

pub use html::HtmlExtractor;
pub use pdf::PdfExtractor;

use crate::error::{IngestError, IngestResult};
use docsum_core::{Document, DocumentFormat};

/// Plain text pulled out of a document.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// The cleaned text content.
    pub content: String,
    /// Document title (if one was found).
    pub title: Option<String>,
    /// Format-specific details recorded alongside the summary.
    pub metadata: serde_json::Value,
}

impl ExtractedText {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Character count of the content.
    pub fn chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// Turns the raw bytes of one format into text.
pub trait Extractor: Send + Sync {
    fn format(&self) -> DocumentFormat;

    fn extract(&self, document: &Document) -> IngestResult<ExtractedText>;
}

/// Extract text with the extractor matching the document's format.
pub fn extract(document: &Document) -> IngestResult<ExtractedText> {
    match &document.format {
        DocumentFormat::Html => HtmlExtractor::new().extract(document),
        DocumentFormat::Pdf => PdfExtractor::new().extract(document),
        DocumentFormat::Unsupported(_) => Err(IngestError::UnsupportedFormat {
            path: document.path.clone(),
            format: document.format.clone(),
        }),
    }
}

/// Trim lines and collapse runs of blank lines to one.
pub(crate) fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .fold(Vec::<&str>::new(), |mut acc, line| {
            let last_was_empty = acc.last().map(|s| s.is_empty()).unwrap_or(true);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim_end()
        .to_string()
}
