//! OpenRouter chat-completion client.
//!
//! Implements the [`ChatModel`] port against any OpenAI-compatible
//! chat-completions endpoint (OpenRouter by default). Requests are made
//! once; there is no retry policy anywhere in this bot, callers race the
//! call against their own deadline instead.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenRouterConfig::new(api_key)
//!     .with_model("meta-llama/llama-3.3-70b-instruct")
//!     .with_base_url("https://openrouter.ai/api/v1");
//!
//! let client = OpenRouterClient::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{ChatModel, Completion, CompletionRequest, ModelError, ModelRole};

/// Configuration for the OpenRouter client.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

impl OpenRouterConfig {
    /// Creates a configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            default_model: "deepseek/deepseek-r1-0528:free".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            timeout: Duration::from_secs(90),
        }
    }

    /// Sets the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenRouter API client.
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterClient {
    /// Creates a client with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts a port request into the provider's wire format.
    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        let mut messages = Vec::new();

        if let Some(prompt) = &request.system_prompt {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(WireMessage {
                role: match msg.role {
                    ModelRole::System => "system",
                    ModelRole::User => "user",
                    ModelRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        WireRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages,
            temperature: request.temperature,
            response_format: request.json_output.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, ModelError> {
        let wire = self.to_wire_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    ModelError::Network(format!("connection failed: {}", e))
                } else {
                    ModelError::Network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses onto the port's error taxonomy.
    async fn handle_response_status(&self, response: Response) -> Result<Response, ModelError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(ModelError::AuthenticationFailed),
            429 => Err(ModelError::RateLimited),
            400 => Err(ModelError::InvalidRequest(error_body)),
            500..=599 => Err(ModelError::Unavailable(format!(
                "server error {}: {}",
                status, error_body
            ))),
            _ => Err(ModelError::Network(format!(
                "unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<Completion, ModelError> {
        let response = self.handle_response_status(response).await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(format!("failed to parse response: {}", e)))?;

        completion_from_wire(wire)
    }
}

#[async_trait]
impl ChatModel for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }
}

/// Extracts the first choice of a wire response.
fn completion_from_wire(wire: WireResponse) -> Result<Completion, ModelError> {
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::Parse("no choices in response".to_string()))?;

    Ok(Completion {
        content: choice.message.content,
        model: wire.model,
    })
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}
