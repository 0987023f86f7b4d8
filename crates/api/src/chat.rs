//! Upstream client for the chat-completion relay.
//!
//! Stateless pass-through: the inbound conversation is forwarded to
//! the configured completion API with bearer auth, and the upstream
//! JSON is relayed verbatim. No retries, no payload transformation
//! beyond JSON decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Inbound chat relay request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

/// Errors from the chat relay path.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Upstream endpoint or credential is unset; no network call was
    /// attempted.
    #[error("AI_API_URL/AI_API_KEY not configured")]
    Configuration,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Chat upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream returned a non-2xx status code.
    #[error("Chat upstream error ({status}): {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw upstream body for debugging.
        body: String,
    },
}

/// Client for the configured chat-completion upstream.
pub struct ChatClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl ChatClient {
    /// Create a client. Empty `url` or `api_key` marks the chat path
    /// as unconfigured; every relay then fails fast with
    /// [`ChatError::Configuration`].
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Forward a conversation upstream and return the decoded response.
    pub async fn relay(&self, request: &ChatRequest) -> Result<Value, ChatError> {
        if self.url.is_empty() || self.api_key.is_empty() {
            return Err(ChatError::Configuration);
        }

        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": request.stream,
        });
        if let Some(max_tokens) = request.max_tokens {
            payload["max_tokens"] = Value::from(max_tokens);
        }

        tracing::info!(model = %request.model, "Relaying chat request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(status = status.as_u16(), %body, "Chat upstream rejected request");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}
