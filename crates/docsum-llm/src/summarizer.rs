//! Summarization stage: input checks, prompting, retries and output limits.

use crate::error::{ContentError, LlmError, LlmResult};
use crate::prompt::{render_summary_prompt, summary_template};
use crate::provider::CompletionProvider;
use crate::types::Completion;
use docsum_config::Config;
use docsum_core::TokenUsage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Limits and retry policy for the summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    /// Maximum summary length in characters.
    pub max_length: usize,
    /// Longest input accepted, in characters.
    pub max_input_chars: usize,
    /// Cut oversized input instead of rejecting it.
    pub truncate_input: bool,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    /// Ceiling for any single retry delay.
    pub max_retry_delay: Duration,
}

impl SummarizerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_length: config.summary.max_length,
            max_input_chars: config.summary.max_input_chars,
            truncate_input: config.summary.truncate_input,
            max_retries: config.provider.max_retries,
            retry_base_delay: Duration::from_millis(config.provider.retry_base_delay_ms),
            max_retry_delay: Duration::from_secs(config.provider.max_retry_delay_secs),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_retry_delay)
    }

    /// Delay before retrying after `error`, honoring `Retry-After` up to the cap.
    fn retry_delay(&self, attempt: u32, error: &LlmError) -> Duration {
        let delay = self.backoff(attempt);
        match error {
            LlmError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => delay
                .max(Duration::from_secs(*secs))
                .min(self.max_retry_delay),
            _ => delay,
        }
    }
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A finished summary plus what the provider reported about it.
#[derive(Debug, Clone)]
pub struct Summary {
    pub text: String,
    /// The summary was cut to `max_length`.
    pub truncated: bool,
    /// The input was cut to `max_input_chars` before sending.
    pub input_truncated: bool,
    pub prompt_template: String,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub metadata: serde_json::Value,
    /// Provider calls made, including retries.
    pub attempts: u32,
}

/// Summarizes extracted text through a [`CompletionProvider`].
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn CompletionProvider>,
    settings: SummarizerSettings,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: SummarizerSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    pub fn settings(&self) -> &SummarizerSettings {
        &self.settings
    }

    /// Summarize `text`, retrying transient provider failures.
    pub async fn summarize(&self, text: &str) -> LlmResult<Summary> {
        let (input, input_truncated) = self.prepare_input(text)?;
        let prompt = render_summary_prompt(input, self.settings.max_length);

        let (completion, attempts) = self.complete_with_retry(&prompt).await?;

        let trimmed = completion.text.trim();
        if trimmed.is_empty() {
            return Err(LlmError::ParseError("provider returned an empty summary".to_string()));
        }

        let (summary, truncated) = truncate_chars(trimmed, self.settings.max_length);
        if truncated {
            warn!(
                "Summary truncated to {} characters",
                self.settings.max_length
            );
        }

        let mut metadata = completion.metadata;
        if input_truncated {
            if let Some(map) = metadata.as_object_mut() {
                map.insert("input_truncated".to_string(), serde_json::Value::Bool(true));
            }
        }

        Ok(Summary {
            text: summary.to_string(),
            truncated,
            input_truncated,
            prompt_template: summary_template(self.settings.max_length),
            provider: self.provider.name().to_string(),
            model: completion.model,
            usage: completion.usage,
            metadata,
            attempts,
        })
    }

    fn prepare_input<'a>(&self, text: &'a str) -> LlmResult<(&'a str, bool)> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContentError::Empty.into());
        }

        let limit = self.settings.max_input_chars;
        let (input, cut) = truncate_chars(text, limit);
        if input.trim().is_empty() {
            return Err(ContentError::Empty.into());
        }
        if cut {
            if !self.settings.truncate_input {
                return Err(ContentError::TooLong {
                    chars: text.chars().count(),
                    limit,
                }
                .into());
            }
            warn!("Input truncated to {} characters before summarizing", limit);
        }

        Ok((input, cut))
    }

    async fn complete_with_retry(&self, prompt: &str) -> LlmResult<(Completion, u32)> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.provider.complete(prompt).await {
                Ok(completion) => return Ok((completion, attempt)),
                Err(e) if e.is_retryable() && attempt <= self.settings.max_retries => {
                    let delay = self.settings.retry_delay(attempt, &e);
                    warn!(
                        "Attempt {} against {} failed: {}. Retrying in {:?}",
                        attempt,
                        self.provider.name(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!("Giving up after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider double that replays scripted results and records prompts.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<LlmResult<Completion>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<LlmResult<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn complete(&self, prompt: &str) -> LlmResult<Completion> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Connection("script exhausted".into())))
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn reply(text: &str) -> LlmResult<Completion> {
        Ok(Completion {
            text: text.to_string(),
            model: "test-model".to_string(),
            usage: TokenUsage {
                input_tokens: Some(10),
                output_tokens: Some(2),
                total_tokens: Some(12),
            },
            metadata: serde_json::json!({"finish_reason": "stop"}),
        })
    }

    fn settings() -> SummarizerSettings {
        SummarizerSettings {
            max_length: 20,
            max_input_chars: 50,
            truncate_input: false,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let provider = ScriptedProvider::new(vec![reply("  Short summary.  ")]);
        let summarizer = Summarizer::new(provider.clone(), settings());

        let summary = summarizer.summarize("Some document text").await.unwrap();

        assert_eq!(summary.text, "Short summary.");
        assert!(!summary.truncated);
        assert_eq!(summary.provider, "scripted");
        assert_eq!(summary.usage.total_tokens, Some(12));
        assert_eq!(summary.attempts, 1);
        assert!(summary.prompt_template.contains("{document}"));

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Some document text"));
        assert!(prompts[0].contains("max 20 characters"));
    }

    #[tokio::test]
    async fn test_long_summary_is_truncated() {
        let provider = ScriptedProvider::new(vec![reply("ééééééééééééééééééééééééé")]);
        let summarizer = Summarizer::new(provider, settings());

        let summary = summarizer.summarize("text").await.unwrap();
        assert!(summary.truncated);
        assert_eq!(summary.text.chars().count(), 20);
    }

    #[tokio::test]
    async fn test_empty_input_is_content_error() {
        let provider = ScriptedProvider::new(vec![]);
        let summarizer = Summarizer::new(provider.clone(), settings());

        let err = summarizer.summarize(" \n\t ").await.unwrap_err();
        assert!(matches!(err, LlmError::Content(ContentError::Empty)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_too_long_input_rejected_or_truncated() {
        let long = "x".repeat(80);

        let provider = ScriptedProvider::new(vec![]);
        let err = Summarizer::new(provider, settings())
            .summarize(&long)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::Content(ContentError::TooLong { chars: 80, limit: 50 })
        ));

        let provider = ScriptedProvider::new(vec![reply("ok")]);
        let mut truncating = settings();
        truncating.truncate_input = true;
        let summary = Summarizer::new(provider.clone(), truncating)
            .summarize(&long)
            .await
            .unwrap();
        assert!(summary.input_truncated);
        assert_eq!(summary.metadata["input_truncated"], true);
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains(&"x".repeat(50)));
        assert!(!prompts[0].contains(&"x".repeat(51)));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let provider = ScriptedProvider::new(vec![
            Err(LlmError::Timeout { seconds: 1 }),
            Err(LlmError::ApiError {
                status: 502,
                message: "bad gateway".into(),
            }),
            reply("Recovered."),
        ]);
        let summarizer = Summarizer::new(provider.clone(), settings());

        let summary = summarizer.summarize("text").await.unwrap();
        assert_eq!(summary.text, "Recovered.");
        assert_eq!(summary.attempts, 3);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let provider = ScriptedProvider::new(vec![
            Err(LlmError::Connection("down".into())),
            Err(LlmError::Connection("down".into())),
            Err(LlmError::Connection("down".into())),
            reply("never reached"),
        ]);
        let summarizer = Summarizer::new(provider.clone(), settings());

        let err = summarizer.summarize("text").await.unwrap_err();
        assert!(matches!(err, LlmError::Connection(_)));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(LlmError::Authentication {
                status: 401,
                message: "bad key".into(),
            }),
            reply("never reached"),
        ]);
        let summarizer = Summarizer::new(provider.clone(), settings());

        let err = summarizer.summarize("text").await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_is_capped() {
        let provider = ScriptedProvider::new(vec![
            Err(LlmError::RateLimited {
                message: "slow down".into(),
                retry_after_secs: Some(86_400),
            }),
            reply("Eventually."),
        ]);
        let summarizer = Summarizer::new(provider.clone(), settings());

        let summary = tokio::time::timeout(Duration::from_secs(3), summarizer.summarize("text"))
            .await
            .expect("retry should not wait for the full Retry-After")
            .unwrap();
        assert_eq!(summary.text, "Eventually.");
        assert_eq!(summary.attempts, 2);
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn test_retry_delay_honors_retry_after_within_cap() {
        let s = SummarizerSettings {
            retry_base_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(60),
            ..settings()
        };
        let limited = |secs| LlmError::RateLimited {
            message: "slow down".into(),
            retry_after_secs: Some(secs),
        };
        assert_eq!(s.retry_delay(1, &limited(5)), Duration::from_secs(5));
        assert_eq!(s.retry_delay(1, &limited(86_400)), Duration::from_secs(60));
        assert_eq!(
            s.retry_delay(1, &LlmError::Timeout { seconds: 1 }),
            Duration::from_millis(500)
        );
        assert_eq!(s.retry_delay(20, &LlmError::Timeout { seconds: 1 }), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_input_truncated_to_nothing_is_content_error() {
        let provider = ScriptedProvider::new(vec![reply("invented")]);
        let mut zero = settings();
        zero.max_input_chars = 0;
        zero.truncate_input = true;

        let err = Summarizer::new(provider.clone(), zero)
            .summarize("Real document text")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Content(ContentError::Empty)));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_backoff_doubles() {
        let s = SummarizerSettings {
            retry_base_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(60),
            ..settings()
        };
        assert_eq!(s.backoff(1), Duration::from_millis(500));
        assert_eq!(s.backoff(2), Duration::from_millis(1000));
        assert_eq!(s.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo", false));
        assert_eq!(truncate_chars("", 3), ("", false));
    }
}
