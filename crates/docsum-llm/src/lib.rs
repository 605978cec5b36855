//! docsum-llm - AI provider clients and the summarization stage.
//!
//! Providers implement [`CompletionProvider`]; the [`Summarizer`] wraps one
//! with input checks, the summary prompt, bounded retries and output limits.

mod error;
mod ollama;
mod openai;
mod prompt;
mod provider;
mod summarizer;
mod types;

pub use error::{ContentError, LlmError, LlmResult};
pub use ollama::OllamaClient;
pub use openai::ChatClient;
pub use prompt::{render_summary_prompt, summary_template};
pub use provider::{from_config, CompletionProvider};
pub use summarizer::{truncate_chars, Summarizer, SummarizerSettings, Summary};
pub use types::*;
