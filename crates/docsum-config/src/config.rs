//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::ConfigSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directories: DirectoriesConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a located source.
    pub fn load(source: &ConfigSource) -> ConfigResult<Self> {
        match source {
            ConfigSource::Explicit(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.clone()));
                }
                Self::load_from(path)
            }
            ConfigSource::Discovered(path) => Self::load_from(path),
            ConfigSource::Defaults => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse TOML, substituting `${VAR}` placeholders from the process environment.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Self::from_toml_str_with_env(contents, |name| std::env::var(name).ok())
    }

    /// Parse TOML with a custom environment lookup.
    pub fn from_toml_str_with_env<F>(contents: &str, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: toml::Value = toml::from_str(contents)?;
        let resolved = resolve_env(raw, &lookup)?;
        let config: Config = resolved.try_into()?;
        Ok(config)
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Render as TOML with the API key masked.
    pub fn to_masked_toml(&self) -> ConfigResult<String> {
        let mut masked = self.clone();
        if let Some(key) = masked.provider.api_key.as_mut() {
            *key = mask_secret(key);
        }
        Ok(toml::to_string_pretty(&masked)?)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.model must not be empty".into()));
        }
        if self.provider.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.provider.kind.requires_api_key()
            && self
                .provider
                .api_key
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(ConfigError::Invalid(format!(
                "provider.api_key is required for provider '{}'",
                self.provider.kind
            )));
        }
        if self.provider.max_retry_delay_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.max_retry_delay_secs must be greater than 0".into(),
            ));
        }
        if self.summary.max_length == 0 {
            return Err(ConfigError::Invalid("summary.max_length must be greater than 0".into()));
        }
        if self.summary.max_input_chars == 0 {
            return Err(ConfigError::Invalid(
                "summary.max_input_chars must be greater than 0".into(),
            ));
        }
        if self.processing.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "processing.concurrency must be at least 1".into(),
            ));
        }
        if self.directories.input_dir() == self.directories.output_dir() {
            return Err(ConfigError::Invalid(
                "directories.input and directories.output must differ".into(),
            ));
        }
        for pattern in &self.directories.ignore_patterns {
            if pattern.trim().is_empty() {
                return Err(ConfigError::Invalid("empty entry in directories.ignore_patterns".into()));
            }
        }
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# docsum configuration
# Summarize HTML and PDF documents with an AI provider.

[directories]
# Folder holding the source documents
input = "input"

# Folder receiving one <file name>.summary.json per document
output = "output"

# Descend into subfolders of the input folder
recursive = false

# File name patterns to ignore
ignore_patterns = [
    "*.tmp",
    "*.part",
    "~$*",
]

[provider]
# xai, openai or ollama
kind = "xai"

# API endpoint; defaults per provider when omitted
# base_url = "https://api.x.ai/v1"

# Values of the form ${NAME} are read from the environment
api_key = "${XAI_API_KEY}"

# Model used for summaries
model = "grok-2-latest"

temperature = 0.7

# Request timeout in seconds
timeout_seconds = 120

# Retries for transient failures (network, rate limits, 5xx)
max_retries = 2
retry_base_delay_ms = 500

# Longest wait between retries, even when the provider asks for more
max_retry_delay_secs = 60

[summary]
# Maximum summary length in characters
max_length = 2500

# Longest extracted text sent to the provider, in characters
max_input_chars = 100000

# Cut longer documents instead of failing them
truncate_input = true

[processing]
# Documents processed at the same time
concurrency = 2

# Regenerate summaries that already exist in the output folder
overwrite = false

[logging]
# trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "info"

# Also append logs to this file
# file = "docsum.log"
"#
        .to_string()
    }
}

/// Input and output folder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoriesConfig {
    pub input: String,
    pub output: String,
    pub recursive: bool,
    pub ignore_patterns: Vec<String>,
}

impl DirectoriesConfig {
    /// Input folder with `~` expanded.
    pub fn input_dir(&self) -> PathBuf {
        expand_path(&self.input)
    }

    /// Output folder with `~` expanded.
    pub fn output_dir(&self) -> PathBuf {
        expand_path(&self.output)
    }
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            input: "input".to_string(),
            output: "output".to_string(),
            recursive: false,
            ignore_patterns: vec!["*.tmp".to_string(), "*.part".to_string(), "~$*".to_string()],
        }
    }
}

/// Which AI backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Xai,
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Xai => "xai",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Xai => "https://api.x.ai/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// AI provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Upper bound on any single retry delay, including `Retry-After`.
    pub max_retry_delay_secs: u64,
}

impl ProviderConfig {
    /// Configured base URL, or the provider's default, without a trailing slash.
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Xai,
            base_url: None,
            api_key: None,
            model: "grok-2-latest".to_string(),
            temperature: 0.7,
            timeout_seconds: 120,
            max_retries: 2,
            retry_base_delay_ms: 500,
            max_retry_delay_secs: 60,
        }
    }
}

/// Summary length and input limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_length: usize,
    pub max_input_chars: usize,
    pub truncate_input: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_length: 2500,
            max_input_chars: 100_000,
            truncate_input: true,
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub concurrency: usize,
    pub overwrite: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            overwrite: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl LoggingConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_path)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Replace every string of the exact form `${NAME}` with the value of `NAME`.
fn resolve_env<F>(value: toml::Value, lookup: &F) -> ConfigResult<toml::Value>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        toml::Value::String(s) => {
            let Some(name) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) else {
                return Ok(toml::Value::String(s));
            };
            match lookup(name) {
                Some(v) if !v.is_empty() => Ok(toml::Value::String(v)),
                _ => Err(ConfigError::MissingEnvVar(name.to_string())),
            }
        }
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| resolve_env(item, lookup))
            .collect::<ConfigResult<Vec<_>>>()
            .map(toml::Value::Array),
        toml::Value::Table(table) => {
            let mut resolved = toml::map::Map::new();
            for (key, item) in table {
                resolved.insert(key, resolve_env(item, lookup)?);
            }
            Ok(toml::Value::Table(resolved))
        }
        other => Ok(other),
    }
}
