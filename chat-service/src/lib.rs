//! chat-service: relays text and image prompts to a hosted multimodal model.
pub mod config;
pub mod error;
pub mod handlers;
pub mod prompt;
pub mod services;
pub mod startup;
pub mod upload;

pub use startup::AppState;
