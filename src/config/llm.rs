//! Chat-completion provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Chat-completion provider configuration.
///
/// Targets any OpenAI-compatible chat-completions endpoint; the default
/// base URL is OpenRouter's.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key for the provider
    pub api_key: Secret<String>,

    /// Base URL of the chat-completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for mention replies and companion chat
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for quiz generation.
    ///
    /// Kept separate from the chat model: quiz generation needs a model
    /// that produces clean JSON objects, which reasoning models that emit
    /// think-tags do not.
    #[serde(default = "default_quiz_model")]
    pub quiz_model: String,

    /// Deadline for a single reply, in seconds
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
}

impl LlmConfig {
    /// Expose the API key for request construction.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Reply deadline as a Duration
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    /// Validate LLM configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("LLM API key"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidLlmBaseUrl);
        }
        if self.reply_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_chat_model() -> String {
    "deepseek/deepseek-r1-0528:free".to_string()
}

fn default_quiz_model() -> String {
    "meta-llama/llama-3.3-70b-instruct".to_string()
}

fn default_reply_timeout() -> u64 {
    60
}
