//! Axum HTTP API server.
//!
//! This crate provides:
//! - REST surface for videos, tracks, avatars, motion jobs and montages
//! - The inbound motion callback endpoint (reconciliation)
//! - Upload rate limiting and security/request middleware
//! - Presigned artifact URLs in responses

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
