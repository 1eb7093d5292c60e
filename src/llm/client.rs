//! The inference client contract.

use crate::models::TokenUsage;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by an inference backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider could not be reached at all.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider error {status}: {detail}")]
    Provider { status: u16, detail: String },

    /// The provider answered but the body could not be decoded.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// One model completion: raw text plus the token accounting for the call.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// A text-or-vision model backend.
///
/// Implementations must be cheap to share across concurrent agent tasks;
/// the per-call timeout is imposed by the caller, not by the client.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send a text-only prompt.
    async fn call_text(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// Send one or more images together with a prompt.
    async fn call_vision(
        &self,
        image_urls: &[String],
        prompt: &str,
    ) -> Result<Completion, LlmError>;
}
