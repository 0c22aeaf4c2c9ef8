//! Mock provider implementation for testing.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use crate::prompt::{PromptPart, PromptParts};
use async_trait::async_trait;
use std::sync::Mutex;

/// Simplified view of a prompt part as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedPart {
    Image {
        mime_type: String,
        width: u32,
        height: u32,
    },
    Text(String),
}

enum Behavior {
    Reply(String),
    Fail(String),
}

/// Mock text provider that replies with canned text or fails, recording every prompt.
pub struct MockTextProvider {
    behavior: Behavior,
    calls: Mutex<Vec<Vec<RecordedPart>>>,
}

impl MockTextProvider {
    /// A provider that answers every call with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Reply(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose calls fail with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<RecordedPart>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, parts: &PromptParts) {
        let recorded = parts
            .iter()
            .map(|part| match part {
                PromptPart::Image(image) => {
                    let (width, height) = image.dimensions();
                    RecordedPart::Image {
                        mime_type: image.mime_type().to_string(),
                        width,
                        height,
                    }
                }
                PromptPart::Text(text) => RecordedPart::Text(text.clone()),
            })
            .collect();

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(recorded);
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, parts: &PromptParts) -> Result<ProviderResponse, ProviderError> {
        self.record(parts);

        match &self.behavior {
            Behavior::Reply(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: parts.text_len() as i32 / 4,
                output_tokens: text.len() as i32 / 4,
                finish_reason: FinishReason::Complete,
            }),
            Behavior::Fail(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }
}
