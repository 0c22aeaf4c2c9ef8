use crate::error::ChatError;
use crate::prompt::{self, ImageUpload};
use crate::startup::AppState;
use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use serde::{Deserialize, Serialize};

/// Chat input extracted from a `multipart/form-data` or urlencoded form.
///
/// Any other body (including an empty one) yields an empty request, which the
/// prompt assembler then rejects as missing input.
#[derive(Debug, Default)]
pub struct ChatRequest {
    pub prompt: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
struct PromptForm {
    #[serde(default)]
    prompt: Option<String>,
}

fn multipart_error(e: MultipartError) -> ChatError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ChatError::PayloadTooLarge
    } else {
        ChatError::InvalidRequest(e.body_text())
    }
}

impl ChatRequest {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ChatError> {
        let mut request = ChatRequest::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "prompt" if request.prompt.is_none() => {
                    let text = field.text().await.map_err(multipart_error)?;
                    request.prompt = Some(text).filter(|t| !t.is_empty());
                }
                "image" if request.image.is_none() => {
                    // A file input left empty is sent as a part with an empty filename.
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !filename.is_empty() {
                        request.image = Some(ImageUpload { filename, bytes });
                    }
                }
                _ => tracing::debug!(field = %name, "Ignoring form field"),
            }
        }

        Ok(request)
    }
}

#[async_trait]
impl<S> FromRequest<S> for ChatRequest
where
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ChatError::InvalidRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<PromptForm>::from_request(req, state)
                .await
                .map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ChatError::PayloadTooLarge
                    } else {
                        ChatError::InvalidRequest(e.body_text())
                    }
                })?;
            Ok(ChatRequest {
                prompt: form.prompt.filter(|p| !p.is_empty()),
                image: None,
            })
        } else {
            tracing::debug!(content_type = %content_type, "Chat request without form body");
            Ok(ChatRequest::default())
        }
    }
}

/// `POST /chat`: relay an optional prompt and optional image to the model.
pub async fn chat(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ChatResponse>, ChatError> {
    state.model.provider()?;

    let chat_request = ChatRequest::from_request(request, &state).await?;

    let parts = prompt::assemble_blocking(
        chat_request.prompt,
        chat_request.image,
        state.config.uploads.allowed_extensions.clone(),
    )
    .await?;

    let response = state.model.generate(&parts).await?;

    Ok(Json(ChatResponse { response }))
}
