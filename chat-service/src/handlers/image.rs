//! Image generation endpoint.
//!
//! No image model is wired in. The endpoint validates its input and answers
//! 501 unless placeholder URLs are enabled in configuration.

use crate::error::ChatError;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

const PLACEHOLDER_BASE_URL: &str = "https://via.placeholder.com/512x512.png?text=Generated+Image+for:";

#[derive(Debug, Deserialize)]
pub struct ImageGenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub image_url: String,
}

/// Placeholder reference derived from the prompt.
///
/// The prompt is percent-encoded into the query string with spaces as `+`.
pub fn placeholder_image_url(prompt: &str) -> String {
    let encoded = urlencoding::encode(prompt).replace("%20", "+");
    format!("{}{}", PLACEHOLDER_BASE_URL, encoded)
}

pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<ImageGenerationRequest>, JsonRejection>,
) -> Result<Json<ImageGenerationResponse>, ChatError> {
    let Json(request) = payload.map_err(|e| ChatError::InvalidRequest(e.body_text()))?;

    let prompt = request
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or(ChatError::MissingImagePrompt)?;

    if !state.config.web.image_placeholder_enabled {
        tracing::warn!(
            prompt_len = prompt.len(),
            "Image generation requested but no image model is configured"
        );
        return Err(ChatError::NotImplemented);
    }

    Ok(Json(ImageGenerationResponse {
        image_url: placeholder_image_url(&prompt),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_url_replaces_spaces() {
        assert_eq!(
            placeholder_image_url("a red fox"),
            "https://via.placeholder.com/512x512.png?text=Generated+Image+for:a+red+fox"
        );
    }

    #[test]
    fn placeholder_url_encodes_query_delimiters() {
        assert_eq!(
            placeholder_image_url("cats & dogs #1?"),
            "https://via.placeholder.com/512x512.png?text=Generated+Image+for:cats+%26+dogs+%231%3F"
        );
    }

    #[test]
    fn placeholder_url_is_deterministic() {
        assert_eq!(placeholder_image_url("cat"), placeholder_image_url("cat"));
    }
}
