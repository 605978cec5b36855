//! CLI command implementations.

pub mod check;
pub mod config;
pub mod init;
pub mod run;

use anyhow::{Context, Result};
use docsum_config::{Config, ConfigSource};
use std::path::Path;
use tracing::debug;

/// How a command finished, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything succeeded.
    Success,
    /// The command ran but at least one document (or check) failed.
    Failures,
    /// Nothing was processed: configuration or setup error.
    Fatal,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failures => 1,
            Status::Fatal => 2,
        }
    }
}

/// Locate the config file relative to the working directory.
pub fn config_source(explicit: Option<&Path>) -> ConfigSource {
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    ConfigSource::locate(explicit, &cwd)
}

/// Load configuration from the located source.
pub fn load_config(source: &ConfigSource) -> Result<Config> {
    let config = Config::load(source).with_context(|| match source.path() {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default configuration".to_string(),
    })?;
    debug!("Using configuration source {:?}", source);
    Ok(config)
}
