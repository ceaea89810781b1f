//! HTTP API handlers for tlab-sp

pub mod auth;
pub mod health;
pub mod predictions;

pub use auth::{token_gate, ParticipantToken};
pub use health::health_routes;
pub use predictions::{get_predictions, upload_predictions};
