//! Error types for provider and summarization operations.

use thiserror::Error;

/// Problems with the text handed to the summarizer. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Extracted text is empty")]
    Empty,

    #[error("Extracted text is too long: {chars} characters (limit {limit})")]
    TooLong { chars: usize, limit: usize },
}

/// Errors that can occur when talking to an AI provider.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Connection error - unable to reach the provider.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Local Ollama server is not running.
    #[error("Ollama server is not running at {host}. Start it with 'ollama serve'.")]
    ServerNotRunning { host: String },

    /// The provider rejected the credentials.
    #[error("Authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    /// The provider is throttling requests.
    #[error("Rate limited by provider: {message}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    /// The requested model is not available.
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to interpret the response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Connection(_)
            | LlmError::Timeout { .. }
            | LlmError::ServerNotRunning { .. }
            | LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// True for problems with the input text rather than the provider.
    pub fn is_content(&self) -> bool {
        matches!(self, LlmError::Content(_))
    }
}

/// Result type for provider operations.
pub type LlmResult<T> = Result<T, LlmError>;
