//! Core domain types for docsum.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format of an input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Html,
    Pdf,
    /// Anything else; carries the file extension (possibly empty).
    Unsupported(String),
}

impl DocumentFormat {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentFormat::Html => "html",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Unsupported(ext) => ext.as_str(),
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "html" | "htm" | "xhtml" => Some(DocumentFormat::Html),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    /// Detect format from the leading bytes of a file.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(DocumentFormat::Pdf);
        }

        let head = &bytes[..bytes.len().min(512)];
        let head = String::from_utf8_lossy(head);
        let head = head.trim_start_matches('\u{feff}').trim_start().to_lowercase();
        if head.starts_with("<!doctype html") || head.starts_with("<html") {
            return Some(DocumentFormat::Html);
        }

        None
    }

    /// Detect format from a path, falling back to content sniffing.
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();

        Self::from_extension(&ext)
            .or_else(|| Self::sniff(bytes))
            .unwrap_or(DocumentFormat::Unsupported(ext))
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentFormat::Unsupported(_))
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Unsupported(ext) if ext.is_empty() => write!(f, "unknown"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// A single input file moving through the pipeline.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute or input-rooted path of the source file.
    pub path: PathBuf,
    /// Path relative to the input folder; drives output naming.
    pub relative_path: PathBuf,
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
    text: Option<String>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, relative_path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let format = DocumentFormat::detect(&path, &bytes);
        Self {
            path,
            relative_path: relative_path.into(),
            bytes,
            format,
            text: None,
        }
    }

    /// File name used in log lines and reports.
    pub fn display_name(&self) -> String {
        self.relative_path.to_string_lossy().to_string()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Record the extracted text. Only the extractor stage calls this.
    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// The JSON record written for one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source: String,
    pub source_format: DocumentFormat,
    pub source_sha256: String,
    pub extracted_chars: usize,
    pub prompt: String,
    pub summary: String,
    pub truncated: bool,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl AnalysisResult {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Why a document did not produce an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Read,
    UnsupportedFormat,
    Parse,
    Provider,
    Content,
    Output,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Read => "read",
            FailureKind::UnsupportedFormat => "unsupported_format",
            FailureKind::Parse => "parse",
            FailureKind::Provider => "provider",
            FailureKind::Content => "content",
            FailureKind::Output => "output",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-document failure recorded in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub path: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a single document.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Summarized { path: String, output: PathBuf },
    Skipped { path: String, output: PathBuf },
    Unsupported { path: String, format: DocumentFormat },
    Failed(DocumentFailure),
}

impl DocumentOutcome {
    pub fn path(&self) -> &str {
        match self {
            DocumentOutcome::Summarized { path, .. }
            | DocumentOutcome::Skipped { path, .. }
            | DocumentOutcome::Unsupported { path, .. } => path,
            DocumentOutcome::Failed(failure) => &failure.path,
        }
    }
}

/// Tally of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub summarized: usize,
    pub skipped: usize,
    pub unsupported: usize,
    pub failures: Vec<DocumentFailure>,
}

impl RunReport {
    pub fn record(&mut self, outcome: DocumentOutcome) {
        match outcome {
            DocumentOutcome::Summarized { .. } => self.summarized += 1,
            DocumentOutcome::Skipped { .. } => self.skipped += 1,
            DocumentOutcome::Unsupported { .. } => self.unsupported += 1,
            DocumentOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.summarized + self.skipped + self.unsupported + self.failed()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sort failures by path so reports read the same regardless of completion order.
    pub fn finalize(mut self) -> Self {
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("html"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_extension("HTM"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("docx"), None);
    }

    #[test]
    fn test_format_sniffing() {
        assert_eq!(DocumentFormat::sniff(b"%PDF-1.7\n..."), Some(DocumentFormat::Pdf));
        assert_eq!(
            DocumentFormat::sniff(b"\n  <!DOCTYPE html><html></html>"),
            Some(DocumentFormat::Html)
        );
        assert_eq!(DocumentFormat::sniff(b"plain words"), None);
    }

    #[test]
    fn test_detect_prefers_extension_then_content() {
        let format = DocumentFormat::detect(Path::new("page.HTML"), b"%PDF-1.4");
        assert_eq!(format, DocumentFormat::Html);

        let format = DocumentFormat::detect(Path::new("saved_page"), b"<html><body>x</body></html>");
        assert_eq!(format, DocumentFormat::Html);

        let format = DocumentFormat::detect(Path::new("notes.txt"), b"hello");
        assert_eq!(format, DocumentFormat::Unsupported("txt".to_string()));
        assert!(!format.is_supported());
    }

    #[test]
    fn test_document_text_lifecycle() {
        let mut doc = Document::new("/in/a.html", "a.html", b"<p>hi</p>".to_vec());
        assert_eq!(doc.format, DocumentFormat::Html);
        assert!(doc.text().is_none());

        doc.set_text("hi".to_string());
        assert_eq!(doc.text(), Some("hi"));
        assert_eq!(doc.display_name(), "a.html");
    }

    #[test]
    fn test_analysis_result_json_roundtrip() {
        let result = AnalysisResult {
            source: "input/report.html".to_string(),
            source_format: DocumentFormat::Html,
            source_sha256: "abc".to_string(),
            extracted_chars: 1200,
            prompt: "Summarize".to_string(),
            summary: "Quarterly revenue grew 12% (café, naïve ünïcode)".to_string(),
            truncated: false,
            provider: "xai".to_string(),
            model: "grok-2-latest".to_string(),
            usage: TokenUsage {
                input_tokens: Some(300),
                output_tokens: Some(40),
                total_tokens: Some(340),
            },
            generated_at: Utc::now(),
            metadata: serde_json::json!({"finish_reason": "stop", "id": "resp-1"}),
        };

        let json = result.to_json_pretty().unwrap();
        let parsed = AnalysisResult::from_json(&json).unwrap();

        assert_eq!(parsed.summary, result.summary);
        assert_eq!(parsed.metadata, result.metadata);
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_run_report_tally() {
        let mut report = RunReport::default();
        report.record(DocumentOutcome::Summarized {
            path: "a.html".into(),
            output: "out/a.html.summary.json".into(),
        });
        report.record(DocumentOutcome::Unsupported {
            path: "b.txt".into(),
            format: DocumentFormat::Unsupported("txt".into()),
        });
        report.record(DocumentOutcome::Failed(DocumentFailure {
            path: "z.pdf".into(),
            kind: FailureKind::Parse,
            message: "bad xref".into(),
        }));
        report.record(DocumentOutcome::Failed(DocumentFailure {
            path: "c.pdf".into(),
            kind: FailureKind::Provider,
            message: "timeout".into(),
        }));

        let report = report.finalize();
        assert_eq!(report.total(), 4);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_success());
        assert_eq!(report.failures[0].path, "c.pdf");
    }
}
