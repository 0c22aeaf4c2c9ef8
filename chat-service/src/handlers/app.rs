use crate::services::get_metrics;
use crate::startup::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub model: String,
    pub image_generation_enabled: bool,
    pub accepted_extensions: String,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        model: state.config.models.text_model.clone(),
        image_generation_enabled: state.config.web.image_placeholder_enabled,
        accepted_extensions: state.config.uploads.allowed_extensions.accept_attribute(),
    }
}

/// Liveness endpoint. Always 200; reports `degraded` when the model client is unavailable.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.model.is_ready() { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "chat-service",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model.model(),
    }))
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for {}", uri.path()))
}
