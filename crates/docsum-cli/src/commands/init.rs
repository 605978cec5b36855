//! Initialize a docsum project in the working directory.

use super::Status;
use anyhow::{Context, Result};
use colored::Colorize;
use docsum_config::{Config, ConfigSource, LOCAL_CONFIG_FILE};
use std::path::PathBuf;

pub fn run(source: &ConfigSource, force: bool) -> Result<Status> {
    let config_file = match source {
        ConfigSource::Explicit(path) => path.clone(),
        _ => PathBuf::from(LOCAL_CONFIG_FILE),
    };

    if config_file.exists() && !force {
        println!(
            "{} Config already exists: {} (use --force to overwrite)",
            "Note:".yellow().bold(),
            config_file.display()
        );
        return Ok(Status::Success);
    }

    println!("{}", "Initializing docsum...".cyan().bold());

    Config::create_default_file(&config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        config_file.display()
    );

    let defaults = Config::default();
    for dir in [defaults.directories.input_dir(), defaults.directories.output_dir()] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        println!("  {} Created folder: {}", "✓".green(), dir.display());
    }

    println!();
    println!("{}", "docsum initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Export your API key: {}", "export XAI_API_KEY=...".cyan());
    println!(
        "  2. Drop HTML or PDF files into: {}",
        defaults.directories.input.cyan()
    );
    println!("  3. Summarize them: {}", "docsum run".cyan());

    Ok(Status::Success)
}
