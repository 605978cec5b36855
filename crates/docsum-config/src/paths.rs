//! Config file locations.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Name of the per-project config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "docsum.toml";

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DOCSUM_CONFIG";

/// Manages application paths following platform conventions.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Create paths using platform-specific directories.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "docsum", "docsum")?;
        let config_dir = proj_dirs.config_dir().to_path_buf();

        Some(Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
        })
    }
}

/// Where the active configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed on the command line or via `DOCSUM_CONFIG`; must exist.
    Explicit(PathBuf),
    /// Found by the default lookup.
    Discovered(PathBuf),
    /// Nothing found, built-in defaults apply.
    Defaults,
}

impl ConfigSource {
    /// Resolve the config file to use.
    ///
    /// Lookup order: the explicit path, then `docsum.toml` in `cwd`, then the
    /// platform config directory.
    pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Self {
        if let Some(path) = explicit {
            return ConfigSource::Explicit(path.to_path_buf());
        }

        let local = cwd.join(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return ConfigSource::Discovered(local);
        }

        match AppPaths::new() {
            Some(paths) if paths.config_file.is_file() => {
                ConfigSource::Discovered(paths.config_file)
            }
            _ => ConfigSource::Defaults,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Discovered(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}
