//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check endpoint: verifies the artifact store and the job queue
/// both answer, and reports the queue depths.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(e) = state.storage.check_connectivity().await {
        warn!(error = %e, "Readiness check failed: storage");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "degraded", "reason": "storage" })),
        );
    }

    match (state.queue.len().await, state.queue.dlq_len().await) {
        (Ok(queued), Ok(dead_lettered)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "queued": queued,
                "dead_lettered": dead_lettered,
            })),
        ),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Readiness check failed: queue");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded", "reason": "queue" })),
            )
        }
    }
}
