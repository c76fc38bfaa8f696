//! Backend trait — the abstraction over completion execution targets.
//!
//! A backend knows how to turn a prompt into completion text, either running
//! on-device ("local") or against a remote API ("cloud"). The Completion
//! Gateway (§4.2 step 9) calls `complete()` without knowing which concrete
//! implementation is behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("backend '{0}' is not configured")]
    NotConfigured(String),

    #[error("backend call timed out after {0}ms")]
    Timeout(u64),

    #[error("backend request failed: {0}")]
    RequestFailed(String),
}

/// A request to a completion backend, assembled by the gateway pipeline
/// after normalization, routing, and policy enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Token usage for a single completion call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A complete (non-streaming) response from a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// The core Backend trait. Implementations: an on-device model service
/// (local) and a remote HTTP provider (cloud).
#[async_trait]
pub trait Backend: Send + Sync {
    /// A human-readable name for this backend (e.g., "local", "openrouter").
    fn name(&self) -> &str;

    /// Whether this backend runs without a network call.
    fn is_local(&self) -> bool;

    /// Send a request and get a complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BackendError>;

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> Result<bool, BackendError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_totals_add_up() {
        let usage = Usage {
            prompt_tokens: 40,
            completion_tokens: 12,
        };
        assert_eq!(usage.total(), 52);
    }
}
