//! Error types for the ingestion pipeline.

use docsum_core::{DocumentFormat, FailureKind};
use docsum_llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Per-document errors. None of these abort a run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported format '{format}' for {path}")]
    UnsupportedFormat { path: PathBuf, format: DocumentFormat },

    #[error("Parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Summarization failed for {path}: {source}")]
    Summarize {
        path: PathBuf,
        #[source]
        source: LlmError,
    },

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] docsum_core::Error),

    #[error("Extraction task failed for {path}: {message}")]
    Task { path: PathBuf, message: String },
}

impl IngestError {
    /// Classify the error for the run report.
    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Read { .. } => FailureKind::Read,
            IngestError::UnsupportedFormat { .. } => FailureKind::UnsupportedFormat,
            IngestError::Parse { .. } | IngestError::Task { .. } => FailureKind::Parse,
            IngestError::Summarize { source, .. } if source.is_content() => FailureKind::Content,
            IngestError::Summarize { .. } => FailureKind::Provider,
            IngestError::Output { .. } | IngestError::Serialize(_) => FailureKind::Output,
        }
    }
}
