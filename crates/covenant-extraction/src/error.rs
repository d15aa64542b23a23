use thiserror::Error;

/// Errors from a language-model backend call.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("model backend unreachable: {0}")]
    Transport(String),

    #[error("model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("model returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("no model configured for role '{0}'")]
    NotConfigured(String),
}

/// Errors from the extraction engine itself.
///
/// Model failures are recovered internally (fallback strategy or empty
/// clause list) and never surface here; what remains is local plumbing.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to serialize structured facts: {0}")]
    FactsSerialization(#[from] serde_json::Error),
}
