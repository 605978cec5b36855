//! The completion provider seam and shared HTTP error handling.

use crate::error::{LlmError, LlmResult};
use crate::ollama::OllamaClient;
use crate::openai::ChatClient;
use crate::types::{Completion, ErrorBody};
use async_trait::async_trait;
use docsum_config::{ProviderConfig, ProviderKind};
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// A backend that turns a prompt into a completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name recorded in results (`xai`, `openai`, `ollama`).
    fn name(&self) -> &str;

    /// Model requests are sent to.
    fn model(&self) -> &str;

    /// Send one prompt and wait for the full response.
    async fn complete(&self, prompt: &str) -> LlmResult<Completion>;

    /// Cheap reachability check.
    async fn is_available(&self) -> bool;
}

/// Build the provider described by the configuration.
pub fn from_config(config: &ProviderConfig) -> LlmResult<Arc<dyn CompletionProvider>> {
    let provider: Arc<dyn CompletionProvider> = match config.kind {
        ProviderKind::Xai | ProviderKind::OpenAi => Arc::new(ChatClient::from_config(config)?),
        ProviderKind::Ollama => Arc::new(OllamaClient::from_config(config)?),
    };
    Ok(provider)
}

pub(crate) fn http_client(timeout: Duration) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("docsum/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LlmError::Http)
}

/// Translate a transport-level failure.
pub(crate) fn send_error(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else if err.is_connect() {
        LlmError::Connection(err.to_string())
    } else {
        LlmError::Http(err)
    }
}

/// Translate a non-success HTTP response.
pub(crate) async fn status_error(response: Response, model: &str) -> LlmError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let message = ErrorBody::message_from(&body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
            retry_after_secs,
            message,
        },
        StatusCode::NOT_FOUND if message.contains("not found") || message.contains(model) => {
            LlmError::ModelNotFound {
                model: model.to_string(),
            }
        }
        _ => LlmError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}
