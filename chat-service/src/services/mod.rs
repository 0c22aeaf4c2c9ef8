pub mod metrics;
pub mod model_client;
pub mod providers;

pub use metrics::{get_metrics, init_metrics};
pub use model_client::ModelClient;
