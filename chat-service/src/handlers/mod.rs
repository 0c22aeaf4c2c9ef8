pub mod app;
pub mod chat;
pub mod image;

pub use app::{health_check, index, metrics, not_found};
pub use chat::chat;
pub use image::generate_image;
