//! Docsum Ingest - Document loading, extraction and the summarization pipeline.
//!
//! This crate provides:
//! - Input folder validation and lazy document enumeration
//! - Text extraction for HTML and PDF
//! - Deterministic output naming and atomic JSON writes
//! - The pipeline that drives documents through the summarizer

mod error;
pub mod extract;
mod loader;
mod naming;
mod pipeline;
mod writer;

pub use error::{IngestError, IngestResult};
pub use extract::{ExtractedText, Extractor, HtmlExtractor, PdfExtractor};
pub use loader::{DocumentEntry, Documents, Loader};
pub use naming::{output_path_for, OUTPUT_SUFFIX};
pub use pipeline::{Pipeline, PipelineOptions, PlannedDocument};
pub use writer::write_result;
