//! Configuration commands.

use super::{load_config, Status};
use anyhow::{Context, Result};
use colored::Colorize;
use docsum_config::{AppPaths, ConfigSource, CONFIG_ENV_VAR, LOCAL_CONFIG_FILE};

pub fn show(source: &ConfigSource) -> Result<Status> {
    let config = load_config(source)?;
    let rendered = config
        .to_masked_toml()
        .context("Failed to render configuration")?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("{}", rendered);

    if let Err(e) = config.validate() {
        println!("{} {}", "Warning:".yellow().bold(), e);
    }

    Ok(Status::Success)
}

pub fn path(source: &ConfigSource) -> Result<Status> {
    match source {
        ConfigSource::Explicit(p) => {
            println!("{}", p.display());
            if !p.is_file() {
                println!("{} file does not exist", "Warning:".yellow().bold());
            }
        }
        ConfigSource::Discovered(p) => println!("{}", p.display()),
        ConfigSource::Defaults => {
            println!("{}", "No config file found, using built-in defaults.".yellow());
            println!("Lookup order:");
            println!("  1. --config or ${}", CONFIG_ENV_VAR);
            println!("  2. ./{}", LOCAL_CONFIG_FILE);
            if let Some(paths) = AppPaths::new() {
                println!("  3. {}", paths.config_file.display());
            }
        }
    }

    Ok(Status::Success)
}
