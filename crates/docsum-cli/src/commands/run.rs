//! Run command: summarize every document in the input folder.

use super::{load_config, Status};
use anyhow::{Context, Result};
use colored::Colorize;
use docsum_config::{Config, ConfigSource};
use docsum_core::{DocumentOutcome, RunReport};
use docsum_ingest::{Loader, Pipeline};
use docsum_llm::{Summarizer, SummarizerSettings};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tokio::runtime::Runtime;

/// Command-line overrides for a run.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub model: Option<String>,
    pub concurrency: Option<usize>,
    pub force: bool,
    pub dry_run: bool,
}

impl RunOptions {
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.directories.input = input.to_string_lossy().to_string();
        }
        if let Some(output) = &self.output {
            config.directories.output = output.to_string_lossy().to_string();
        }
        if let Some(model) = &self.model {
            config.provider.model = model.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.processing.concurrency = concurrency;
        }
        if self.force {
            config.processing.overwrite = true;
        }
    }
}

pub fn run(source: &ConfigSource, options: RunOptions) -> Result<Status> {
    let mut config = load_config(source)?;
    options.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let loader = Loader::from_config(&config).context("Cannot use the configured folders")?;

    let provider =
        docsum_llm::from_config(&config.provider).context("Failed to create provider client")?;
    let summarizer = Summarizer::new(provider, SummarizerSettings::from_config(&config));
    let pipeline = Pipeline::from_config(&config, summarizer);

    println!("{} {}", "Scanning:".cyan(), loader.input_dir().display());

    if options.dry_run {
        return dry_run(&pipeline, &loader);
    }

    println!(
        "Summarizing with {} ({})",
        config.provider.model.cyan(),
        config.provider.kind
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} done {msg}")?,
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let rt = Runtime::new().context("Failed to create async runtime")?;
    let report = rt.block_on(pipeline.run_with_progress(&loader, |outcome| {
        pb.inc(1);
        pb.set_message(outcome_label(outcome));
    }));

    pb.finish_and_clear();
    print_report(&report);

    Ok(if report.is_success() {
        Status::Success
    } else {
        Status::Failures
    })
}

fn dry_run(pipeline: &Pipeline, loader: &Loader) -> Result<Status> {
    let plan = pipeline.plan(loader);
    if plan.is_empty() {
        println!("{}", "No documents found.".yellow());
        return Ok(Status::Success);
    }

    println!("Found {} files", plan.len());
    let mut failed = false;
    for item in &plan {
        match item {
            Ok(doc) if !doc.format.is_supported() => {
                println!("  {} [{}] {}", doc.path, doc.format, "unsupported".yellow());
            }
            Ok(doc) if doc.exists && !pipeline.options().overwrite => {
                println!("  {} [{}] {}", doc.path, doc.format, "exists, skipped".dimmed());
            }
            Ok(doc) => {
                println!("  {} [{}] -> {}", doc.path, doc.format, doc.output.display());
            }
            Err(e) => {
                failed = true;
                println!("  {} {}", "✗".red(), e);
            }
        }
    }
    println!("\n{}", "Dry run - no documents were summarized.".cyan());

    Ok(if failed { Status::Failures } else { Status::Success })
}

fn outcome_label(outcome: &DocumentOutcome) -> String {
    match outcome {
        DocumentOutcome::Summarized { path, .. } => path.clone(),
        DocumentOutcome::Skipped { path, .. } => format!("{} (exists)", path),
        DocumentOutcome::Unsupported { path, .. } => format!("{} (unsupported)", path),
        DocumentOutcome::Failed(f) => format!("{} (failed)", f.path),
    }
}

fn print_report(report: &RunReport) {
    if report.total() == 0 {
        println!("{}", "No documents found.".yellow());
        return;
    }

    println!("\n{} {} documents", "Summarized:".green().bold(), report.summarized);
    if report.skipped > 0 {
        println!(
            "{} {} documents (output exists, use --force to redo)",
            "Skipped:".yellow().bold(),
            report.skipped
        );
    }
    if report.unsupported > 0 {
        println!("{} {} files", "Unsupported:".yellow().bold(), report.unsupported);
    }
    if report.failed() > 0 {
        println!("{} {} documents", "Failed:".red().bold(), report.failed());
        for failure in &report.failures {
            println!(
                "  {} {} [{}] {}",
                "✗".red(),
                failure.path,
                failure.kind,
                failure.message.dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        let options = RunOptions {
            input: Some("docs".into()),
            output: Some("summaries".into()),
            model: Some("grok-beta".into()),
            concurrency: Some(4),
            force: true,
            dry_run: false,
        };

        options.apply(&mut config);

        assert_eq!(config.directories.input, "docs");
        assert_eq!(config.directories.output, "summaries");
        assert_eq!(config.provider.model, "grok-beta");
        assert_eq!(config.processing.concurrency, 4);
        assert!(config.processing.overwrite);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        RunOptions::default().apply(&mut config);
        assert_eq!(config.directories.input, "input");
        assert!(!config.processing.overwrite);
    }
}
