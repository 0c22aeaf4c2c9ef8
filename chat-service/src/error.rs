use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Terminal failures of a chat or image-generation request.
///
/// The `Display` text is the message returned to the caller in `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("A prompt or an image is required")]
    MissingInput,

    #[error("Prompt is required for image generation")]
    MissingImagePrompt,

    #[error("Invalid file type")]
    UnsupportedFileType,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Uploaded file is too large")]
    PayloadTooLarge,

    #[error("Could not process image file")]
    ImageDecode(#[source] image::ImageError),

    #[error("Gemini API not configured")]
    ServiceUnavailable,

    #[error("An error occurred with the Gemini API: {0}")]
    ExternalService(String),

    #[error("Image generation is not implemented")]
    NotImplemented,

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::MissingInput
            | ChatError::MissingImagePrompt
            | ChatError::UnsupportedFileType
            | ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ChatError::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ChatError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(ChatError::MissingInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ChatError::UnsupportedFileType.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn upstream_errors_map_to_5xx() {
        assert_eq!(
            ChatError::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ChatError::Internal(anyhow::anyhow!("task panicked")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err = ChatError::ExternalService("quota exceeded".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.to_string(),
            "An error occurred with the Gemini API: quota exceeded"
        );
    }

    #[test]
    fn missing_input_message_is_stable() {
        assert_eq!(
            ChatError::MissingInput.to_string(),
            "A prompt or an image is required"
        );
    }
}
