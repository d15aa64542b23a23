//! Deterministic model stubs for tests and offline development.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::backend::ModelBackend;
use crate::error::ModelError;

/// Returns queued canned responses in order, recording every call.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(model_id, prompt)` pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedModel {
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((model_id.to_string(), prompt.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::InvalidResponse("script exhausted".into()))
    }
}

/// Fails every call with the configured error.
pub struct FailingModel {
    error: ModelError,
}

impl FailingModel {
    pub fn new(error: ModelError) -> Self {
        Self { error }
    }

    pub fn unreachable() -> Self {
        Self::new(ModelError::Transport("connection refused".into()))
    }
}

#[async_trait]
impl ModelBackend for FailingModel {
    async fn generate(
        &self,
        _model_id: &str,
        _prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, ModelError> {
        Err(self.error.clone())
    }
}
