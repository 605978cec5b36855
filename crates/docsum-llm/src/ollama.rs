//! Ollama HTTP client.

use crate::error::{LlmError, LlmResult};
use crate::provider::{http_client, send_error, status_error, CompletionProvider};
use crate::types::*;
use async_trait::async_trait;
use docsum_config::ProviderConfig;
use docsum_core::TokenUsage;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Client for interacting with a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &ProviderConfig) -> LlmResult<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);

        Ok(Self {
            client: http_client(timeout)?,
            host: config.base_url(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    /// Map a send failure, recognising a server that is simply not running.
    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_connect() {
            LlmError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else {
            send_error(err, self.timeout)
        }
    }

    /// List all available models.
    pub async fn list_models(&self) -> LlmResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(status_error(response, &self.model).await);
        }

        let list: ListModelsResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model is available.
    pub async fn has_model(&self, model: &str) -> LlmResult<bool> {
        let models = self.list_models().await?;
        // Check both exact match and model without tag
        Ok(models
            .iter()
            .any(|m| m.name == model || m.name.starts_with(&format!("{}:", model))))
    }

    /// Generate text (non-streaming).
    pub async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let url = format!("{}/api/generate", self.host);
        debug!("Generating with model {}", request.model);

        let mut request = request;
        request.stream = false;

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(status_error(response, &request.model).await);
        }

        let body = response.text().await.map_err(|e| send_error(e, self.timeout))?;
        let generated: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;
        info!(
            "Generated {} chars with {} (eval_count={:?})",
            generated.response.len(),
            generated.model,
            generated.eval_count
        );
        Ok(generated)
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> LlmResult<Completion> {
        let request = GenerateRequest::new(&self.model, prompt)
            .with_options(GenerateOptions::new().with_temperature(self.temperature));
        let response = self.generate(request).await?;

        let total_tokens = match (response.prompt_eval_count, response.eval_count) {
            (Some(p), Some(e)) => Some(p + e),
            _ => None,
        };

        Ok(Completion {
            text: response.response,
            model: response.model,
            usage: TokenUsage {
                input_tokens: response.prompt_eval_count,
                output_tokens: response.eval_count,
                total_tokens,
            },
            metadata: serde_json::json!({
                "done_reason": response.done_reason,
                "total_duration_ns": response.total_duration,
                "load_duration_ns": response.load_duration,
                "eval_duration_ns": response.eval_duration,
            }),
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
