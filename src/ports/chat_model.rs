//! Chat-model port - interface to the LLM backend.
//!
//! Abstracts the chat-completion service (OpenRouter, a local model, ...)
//! so the chat and quiz services can generate text without coupling to a
//! specific provider or wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::chat::{ChatMessage, ChatRole};

/// Port for chat-completion requests.
///
/// Implementations connect to an external model service and translate
/// between its API and our request/response types. Callers enforce their
/// own deadlines by racing `complete` against a timer; implementations do
/// **not** retry.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generates a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError>;
}

/// A request for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier; the implementation's default model when `None`.
    pub model: Option<String>,
    /// System prompt guiding the reply.
    pub system_prompt: Option<String>,
    /// Conversation messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Sampling temperature; provider default when `None`.
    pub temperature: Option<f32>,
    /// Ask the provider for a bare JSON object instead of prose.
    pub json_output: bool,
}

impl CompletionRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self {
            model: None,
            system_prompt: None,
            messages: Vec::new(),
            temperature: None,
            json_output: false,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Appends a message.
    pub fn with_message(mut self, role: ModelRole, content: impl Into<String>) -> Self {
        self.messages.push(ModelMessage {
            role,
            content: content.into(),
        });
        self
    }

    /// Appends a stored chat history.
    pub fn with_history(mut self, history: &[ChatMessage]) -> Self {
        self.messages
            .extend(history.iter().map(ModelMessage::from));
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Requests a JSON-object reply.
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// A message on the model wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: ModelRole,
    pub content: String,
}

/// Role of a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    System,
    User,
    Assistant,
}

impl From<&ChatMessage> for ModelMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            ChatRole::User => ModelRole::User,
            ChatRole::Assistant => ModelRole::Assistant,
        };
        Self {
            role,
            content: msg.content.clone(),
        }
    }
}

/// A completed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text.
    pub content: String,
    /// Model that produced it, as reported by the provider.
    pub model: String,
}

/// Chat-model errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// The request exceeded the client-side deadline.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// API key was rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Provider asked us to back off.
    #[error("rate limited")]
    RateLimited,

    /// Provider returned a server error.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The provider's response could not be understood.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
