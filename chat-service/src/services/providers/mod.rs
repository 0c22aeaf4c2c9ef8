//! AI provider abstractions and implementations.
//!
//! The relay only needs text output from a multimodal prompt, so a single
//! [`TextProvider`] trait covers the real Gemini backend and the mock used in
//! tests.

pub mod gemini;
pub mod mock;

use crate::prompt::PromptParts;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            None | Some("STOP") | Some("FINISH_REASON_UNSPECIFIED") => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Other,
        }
    }
}

/// A model that turns an ordered multimodal prompt into text.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Model identifier, for logs and health output.
    fn model(&self) -> &str;

    /// Generate a complete (non-streamed) text response.
    async fn generate(&self, parts: &PromptParts) -> Result<ProviderResponse, ProviderError>;
}
