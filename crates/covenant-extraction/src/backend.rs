//! Model backend abstraction and the OpenAI-style HTTP adapter.
//!
//! Backends are cognition-only: they produce text, never side effects.
//! All calls carry a bounded timeout; timeout and transport
//! failures come back as typed errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ModelError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// A pluggable language-model backend.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Generate a completion for `prompt` with the given model.
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ModelError>;
}

/// Chat-completions request body (OpenAI wire shape).
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// HTTP adapter for any OpenAI-compatible completions endpoint.
pub struct HttpModelBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl HttpModelBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ModelError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: None,
            timeout_secs,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl ModelBackend for HttpModelBackend {
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ModelError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: model_id.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            // Deterministic as the endpoint allows; the mapping step does
            // not depend on it.
            temperature: 0.0,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(model = model_id, url = %url, "model call");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout {
                    seconds: self.timeout_secs,
                }
            } else {
                ModelError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ModelError::Transport(format!(
                "HTTP {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::InvalidResponse("response carried no choices".into()))
    }
}
