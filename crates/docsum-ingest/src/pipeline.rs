//! The loader → extractor → summarizer → writer pipeline.

use crate::error::{IngestError, IngestResult};
use crate::extract::{self, ExtractedText};
use crate::loader::{DocumentEntry, Loader};
use crate::naming::output_path_for;
use crate::writer::write_result;
use chrono::Utc;
use docsum_config::Config;
use docsum_core::{
    AnalysisResult, Document, DocumentFailure, DocumentFormat, DocumentOutcome, RunReport,
};
use docsum_llm::Summarizer;
use futures_util::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    /// Regenerate outputs that already exist.
    pub overwrite: bool,
    /// Documents in flight at once.
    pub concurrency: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.directories.output_dir(),
            overwrite: config.processing.overwrite,
            concurrency: config.processing.concurrency,
        }
    }
}

/// A document a dry run would process.
#[derive(Debug, Clone)]
pub struct PlannedDocument {
    pub path: String,
    pub format: DocumentFormat,
    pub output: PathBuf,
    /// An output already exists and would be kept.
    pub exists: bool,
}

/// Drives every document in a [`Loader`] through extraction and summarization.
pub struct Pipeline {
    summarizer: Summarizer,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(summarizer: Summarizer, options: PipelineOptions) -> Self {
        Self {
            summarizer,
            options,
        }
    }

    pub fn from_config(config: &Config, summarizer: Summarizer) -> Self {
        Self::new(summarizer, PipelineOptions::from_config(config))
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process every document and return the tally.
    pub async fn run(&self, loader: &Loader) -> RunReport {
        self.run_with_progress(loader, |_| {}).await
    }

    /// Like [`Pipeline::run`], calling `on_outcome` as each document finishes.
    pub async fn run_with_progress<F>(&self, loader: &Loader, mut on_outcome: F) -> RunReport
    where
        F: FnMut(&DocumentOutcome),
    {
        let concurrency = self.options.concurrency.max(1);
        info!("Processing documents with concurrency {}", concurrency);

        let input_dir = loader.input_dir();
        let outcomes = stream::iter(loader.documents())
            .map(|item| self.process(input_dir, item))
            .buffer_unordered(concurrency);
        futures_util::pin_mut!(outcomes);

        let mut report = RunReport::default();
        while let Some(outcome) = outcomes.next().await {
            on_outcome(&outcome);
            report.record(outcome);
        }

        let report = report.finalize();
        info!(
            "Run finished: {} summarized, {} skipped, {} unsupported, {} failed",
            report.summarized,
            report.skipped,
            report.unsupported,
            report.failed()
        );
        report
    }

    /// List what a run would do without extracting or calling the provider.
    pub fn plan(&self, loader: &Loader) -> Vec<IngestResult<PlannedDocument>> {
        loader
            .documents()
            .map(|item| {
                item.and_then(DocumentEntry::read).map(|document| {
                    let output = output_path_for(&self.options.output_dir, &document.relative_path);
                    PlannedDocument {
                        path: document.display_name(),
                        format: document.format.clone(),
                        exists: output.exists(),
                        output,
                    }
                })
            })
            .collect()
    }

    async fn process(
        &self,
        input_dir: &Path,
        item: IngestResult<DocumentEntry>,
    ) -> DocumentOutcome {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let path = match &e {
                    IngestError::Read { path, .. } => relative_name(input_dir, path),
                    _ => String::new(),
                };
                return failed(path, e);
            }
        };

        let name = entry.display_name();
        let document = match entry.load().await {
            Ok(document) => document,
            Err(e) => return failed(name, e),
        };
        match self.process_document(document).await {
            Ok(outcome) => outcome,
            Err(e) => failed(name, e),
        }
    }

    async fn process_document(&self, mut document: Document) -> IngestResult<DocumentOutcome> {
        let name = document.display_name();

        if !document.format.is_supported() {
            warn!("Skipping {}: unsupported format '{}'", name, document.format);
            return Ok(DocumentOutcome::Unsupported {
                path: name,
                format: document.format,
            });
        }

        let output = output_path_for(&self.options.output_dir, &document.relative_path);
        if output.exists() && !self.options.overwrite {
            info!("Skipping {}: output already exists", name);
            return Ok(DocumentOutcome::Skipped { path: name, output });
        }

        debug!("Extracting {} as {}", name, document.format);
        let (document_back, extracted) = extract_blocking(document).await?;
        document = document_back;
        let extracted = extracted?;
        let extracted_chars = extracted.chars();
        document.set_text(extracted.content);
        let text = document.text().unwrap_or_default();

        let summary = self
            .summarizer
            .summarize(text)
            .await
            .map_err(|source| IngestError::Summarize {
                path: document.path.clone(),
                source,
            })?;

        let result = AnalysisResult {
            source: name.clone(),
            source_format: document.format.clone(),
            source_sha256: sha256_hex(&document.bytes),
            extracted_chars,
            prompt: summary.prompt_template,
            summary: summary.text,
            truncated: summary.truncated,
            provider: summary.provider,
            model: summary.model,
            usage: summary.usage,
            generated_at: Utc::now(),
            metadata: serde_json::json!({
                "document": extracted.metadata,
                "title": extracted.title,
                "provider": summary.metadata,
                "attempts": summary.attempts,
            }),
        };

        write_result(&output, &result)?;
        info!(
            "Summarized {} -> {} ({} chars)",
            name,
            output.display(),
            result.summary.chars().count()
        );

        Ok(DocumentOutcome::Summarized { path: name, output })
    }
}

/// Run extraction on the blocking pool; PDF parsing is CPU-bound.
async fn extract_blocking(
    document: Document,
) -> IngestResult<(Document, IngestResult<ExtractedText>)> {
    let path = document.path.clone();
    tokio::task::spawn_blocking(move || {
        let extracted = extract::extract(&document);
        (document, extracted)
    })
    .await
    .map_err(|e| IngestError::Task {
        path,
        message: e.to_string(),
    })
}

/// `path` relative to the input folder, as the report names documents.
fn relative_name(input_dir: &Path, path: &Path) -> String {
    path.strip_prefix(input_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn failed(path: String, err: IngestError) -> DocumentOutcome {
    error!("Failed to process {}: {}", path, err);
    DocumentOutcome::Failed(DocumentFailure {
        path,
        kind: err.kind(),
        message: err.to_string(),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsum_core::{FailureKind, TokenUsage};
    use docsum_llm::{Completion, CompletionProvider, LlmError, LlmResult, SummarizerSettings};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// Provider double: echoes a fixed summary, fails on prompts containing `FAIL`.
    struct FakeProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn complete(&self, prompt: &str) -> LlmResult<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains("FAIL") {
                return Err(LlmError::Authentication {
                    status: 401,
                    message: "rejected".into(),
                });
            }
            Ok(Completion {
                text: "A concise summary.".into(),
                model: "fake-model".into(),
                usage: TokenUsage {
                    input_tokens: Some(100),
                    output_tokens: Some(4),
                    total_tokens: Some(104),
                },
                metadata: serde_json::json!({"finish_reason": "stop"}),
            })
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        output: PathBuf,
        provider: Arc<FakeProvider>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let input = dir.path().join("input");
            let output = dir.path().join("output");
            std::fs::create_dir(&input).unwrap();
            Self {
                _dir: dir,
                input,
                output,
                provider: Arc::new(FakeProvider {
                    calls: AtomicUsize::new(0),
                }),
            }
        }

        fn write(&self, name: &str, contents: &[u8]) {
            std::fs::write(self.input.join(name), contents).unwrap();
        }

        fn loader(&self) -> Loader {
            Loader::new(&self.input, &self.output, false, &[]).unwrap()
        }

        fn pipeline(&self, overwrite: bool) -> Pipeline {
            let settings = SummarizerSettings {
                max_length: 2500,
                max_input_chars: 100_000,
                truncate_input: true,
                max_retries: 0,
                retry_base_delay: Duration::from_millis(1),
                max_retry_delay: Duration::from_millis(10),
            };
            Pipeline::new(
                Summarizer::new(self.provider.clone(), settings),
                PipelineOptions {
                    output_dir: self.output.clone(),
                    overwrite,
                    concurrency: 2,
                },
            )
        }

        fn outputs(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(&self.output)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            names
        }

        fn calls(&self) -> usize {
            self.provider.calls.load(Ordering::SeqCst)
        }
    }

    fn page(body: &str) -> Vec<u8> {
        format!("<html><head><title>T</title></head><body><p>{}</p></body></html>", body)
            .into_bytes()
    }

    #[tokio::test]
    async fn test_one_output_per_valid_document() {
        let fx = Fixture::new();
        fx.write("a.html", &page("Alpha"));
        fx.write("b.htm", &page("Beta"));

        let report = fx.pipeline(false).run(&fx.loader()).await;

        assert_eq!(report.summarized, 2);
        assert!(report.is_success());
        assert_eq!(
            fx.outputs(),
            vec!["a.html.summary.json", "b.htm.summary.json"]
        );
    }

    #[tokio::test]
    async fn test_output_json_round_trips() {
        let fx = Fixture::new();
        fx.write("a.html", &page("Alpha beta gamma"));

        fx.pipeline(false).run(&fx.loader()).await;

        let json = std::fs::read_to_string(fx.output.join("a.html.summary.json")).unwrap();
        let result = AnalysisResult::from_json(&json).unwrap();
        assert_eq!(result.source, "a.html");
        assert_eq!(result.source_format, DocumentFormat::Html);
        assert_eq!(result.summary, "A concise summary.");
        assert_eq!(result.provider, "fake");
        assert_eq!(result.model, "fake-model");
        assert_eq!(result.usage.input_tokens, Some(100));
        assert_eq!(result.source_sha256, sha256_hex(&page("Alpha beta gamma")));
        assert_eq!(result.source_sha256.len(), 64);
        assert!(result.prompt.contains("{document}"));
        assert_eq!(result.metadata["provider"]["finish_reason"], "stop");
        assert_eq!(result.metadata["document"]["format"], "html");
        assert_eq!(result.metadata["title"], "T");
        assert_eq!(result.metadata["attempts"], 1);
    }

    #[tokio::test]
    async fn test_malformed_document_produces_no_output_and_run_continues() {
        let fx = Fixture::new();
        fx.write("good.html", &page("Fine"));
        fx.write("broken.pdf", b"%PDF-1.7 garbage");
        fx.write("bad.html", &[0xff, 0xfe, 0x00]);

        let report = fx.pipeline(false).run(&fx.loader()).await;

        assert_eq!(report.summarized, 1);
        assert_eq!(report.failed(), 2);
        assert!(report.failures.iter().all(|f| f.kind == FailureKind::Parse));
        // Sorted by path.
        assert_eq!(report.failures[0].path, "bad.html");
        assert_eq!(report.failures[1].path, "broken.pdf");
        assert_eq!(fx.outputs(), vec!["good.html.summary.json"]);
    }

    #[tokio::test]
    async fn test_provider_failure_is_isolated() {
        let fx = Fixture::new();
        fx.write("a.html", &page("Alpha"));
        fx.write("b.html", &page("FAIL here"));
        fx.write("c.html", &page("Gamma"));

        let report = fx.pipeline(false).run(&fx.loader()).await;

        assert_eq!(report.summarized, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].path, "b.html");
        assert_eq!(report.failures[0].kind, FailureKind::Provider);
        assert!(!fx.output.join("b.html.summary.json").exists());
    }

    #[tokio::test]
    async fn test_empty_page_is_content_failure() {
        let fx = Fixture::new();
        fx.write("blank.html", b"<html><body><script>x()</script></body></html>");

        let report = fx.pipeline(false).run(&fx.loader()).await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Content);
        assert_eq!(fx.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_folder() {
        let fx = Fixture::new();

        let report = fx.pipeline(false).run(&fx.loader()).await;

        assert_eq!(report.total(), 0);
        assert!(report.is_success());
        assert!(fx.outputs().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_files_are_counted_not_failed() {
        let fx = Fixture::new();
        fx.write("notes.txt", b"plain text");
        fx.write("a.html", &page("Alpha"));

        let mut seen = Vec::new();
        let report = fx
            .pipeline(false)
            .run_with_progress(&fx.loader(), |o| seen.push(o.path().to_string()))
            .await;

        assert_eq!(report.unsupported, 1);
        assert_eq!(report.summarized, 1);
        assert!(report.is_success());
        seen.sort();
        assert_eq!(seen, vec!["a.html", "notes.txt"]);
    }

    #[tokio::test]
    async fn test_existing_outputs_are_skipped_unless_overwrite() {
        let fx = Fixture::new();
        fx.write("a.html", &page("Alpha"));

        let first = fx.pipeline(false).run(&fx.loader()).await;
        assert_eq!(first.summarized, 1);
        let path = fx.output.join("a.html.summary.json");
        let before = std::fs::read_to_string(&path).unwrap();

        let second = fx.pipeline(false).run(&fx.loader()).await;
        assert_eq!(second.skipped, 1);
        assert_eq!(fx.calls(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let third = fx.pipeline(true).run(&fx.loader()).await;
        assert_eq!(third.summarized, 1);
        assert_eq!(fx.calls(), 2);
        // Same file name on every run.
        assert_eq!(fx.outputs(), vec!["a.html.summary.json"]);
    }

    #[test]
    fn test_plan_lists_targets_without_processing() {
        let fx = Fixture::new();
        fx.write("a.html", &page("Alpha"));
        fx.write("b.pdf", b"%PDF-1.4");

        let plan: Vec<PlannedDocument> = fx
            .pipeline(false)
            .plan(&fx.loader())
            .into_iter()
            .map(|p| p.unwrap())
            .collect();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].format, DocumentFormat::Html);
        assert_eq!(plan[1].format, DocumentFormat::Pdf);
        assert_eq!(plan[1].output, fx.output.join("b.pdf.summary.json"));
        assert!(!plan[0].exists);
        assert_eq!(fx.calls(), 0);
        assert!(Path::new(&fx.output).read_dir().unwrap().next().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_entry_reported_relative_to_input() {
        let fx = Fixture::new();
        fx.write("a.html", &page("Alpha"));
        std::os::unix::fs::symlink(fx.input.join("missing.html"), fx.input.join("dangling.html"))
            .unwrap();

        let report = fx.pipeline(false).run(&fx.loader()).await;

        assert_eq!(report.summarized, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Read);
        assert_eq!(report.failures[0].path, "dangling.html");
    }

    #[test]
    fn test_relative_name() {
        let input = Path::new("/data/input");
        assert_eq!(relative_name(input, Path::new("/data/input/sub/a.pdf")), "sub/a.pdf");
        assert_eq!(relative_name(input, Path::new("/elsewhere/b.html")), "/elsewhere/b.html");
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
