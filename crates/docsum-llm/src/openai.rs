//! Client for OpenAI-compatible chat completion APIs (xAI, OpenAI).

use crate::error::{LlmError, LlmResult};
use crate::provider::{http_client, send_error, status_error, CompletionProvider};
use crate::types::{ChatRequest, ChatResponse, Completion};
use async_trait::async_trait;
use docsum_config::ProviderConfig;
use docsum_core::TokenUsage;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Client for a `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    name: &'static str,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl ChatClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &ProviderConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                LlmError::InvalidConfig(format!("an API key is required for {}", config.kind))
            })?
            .to_string();

        let timeout = Duration::from_secs(config.timeout_seconds);

        Ok(Self {
            client: http_client(timeout)?,
            name: config.kind.as_str(),
            base_url: config.base_url(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    /// Send a single-turn chat request.
    pub async fn chat(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Chat completion with model {} at {}", request.model, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response, &request.model).await);
        }

        let body = response.text().await.map_err(|e| send_error(e, self.timeout))?;
        serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> LlmResult<Completion> {
        let request = ChatRequest::new(&self.model, prompt).with_temperature(self.temperature);
        let response = self.chat(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("response contained no choices".to_string()))?;

        let usage = response.usage.unwrap_or_default();

        Ok(Completion {
            text: choice.message.content,
            model: response.model.unwrap_or_else(|| self.model.clone()),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            metadata: serde_json::json!({
                "id": response.id,
                "created": response.created,
                "finish_reason": choice.finish_reason,
            }),
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
