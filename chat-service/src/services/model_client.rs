//! Process-wide handle to the external model.
//!
//! Built once at startup and shared read-only by every request. A failed
//! initialization is kept as an explicit [`ModelClient::Unavailable`] value so
//! handlers can refuse work without attempting a call.

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::prompt::PromptParts;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub enum ModelClient {
    Ready(Arc<dyn TextProvider>),
    Unavailable { reason: String },
}

impl ModelClient {
    pub fn ready(provider: Arc<dyn TextProvider>) -> Self {
        ModelClient::Ready(provider)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelClient::Unavailable {
            reason: reason.into(),
        }
    }

    /// Build the Gemini client from configuration.
    pub fn from_config(config: &ChatConfig) -> Self {
        let Some(api_key) = config.google.api_key.clone() else {
            tracing::error!("Error configuring Gemini API: GEMINI_API_KEY is not set");
            return Self::unavailable("GEMINI_API_KEY is not set");
        };

        let gemini_config = GeminiConfig {
            api_key,
            model: config.models.text_model.clone(),
            api_base: config.models.api_base.clone(),
            timeout: Duration::from_secs(config.models.request_timeout_secs),
        };

        match GeminiTextProvider::new(gemini_config) {
            Ok(provider) => {
                tracing::info!(
                    model = %config.models.text_model,
                    "Initialized Gemini text provider"
                );
                Self::ready(Arc::new(provider))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error configuring Gemini API");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelClient::Ready(_))
    }

    /// Model name when ready.
    pub fn model(&self) -> Option<&str> {
        match self {
            ModelClient::Ready(provider) => Some(provider.model()),
            ModelClient::Unavailable { .. } => None,
        }
    }

    /// The provider, or [`ChatError::ServiceUnavailable`] if initialization failed.
    pub fn provider(&self) -> Result<&Arc<dyn TextProvider>, ChatError> {
        match self {
            ModelClient::Ready(provider) => Ok(provider),
            ModelClient::Unavailable { .. } => Err(ChatError::ServiceUnavailable),
        }
    }

    /// Send the prompt and return the generated text verbatim.
    ///
    /// Any provider failure becomes [`ChatError::ExternalService`] carrying the
    /// provider's message. Nothing is retried.
    pub async fn generate(&self, parts: &PromptParts) -> Result<String, ChatError> {
        let provider = self.provider()?;

        let response = provider.generate(parts).await.map_err(|e| {
            tracing::error!(
                model = %provider.model(),
                error = %e,
                "Error during Gemini API call"
            );
            ChatError::ExternalService(e.to_string())
        })?;

        tracing::info!(
            model = %provider.model(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Gemini API call completed"
        );

        Ok(response.text)
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelClient::Ready(provider) => f
                .debug_struct("Ready")
                .field("model", &provider.model())
                .finish(),
            ModelClient::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
