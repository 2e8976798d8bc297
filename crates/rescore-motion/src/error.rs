//! Motion client error types.

use thiserror::Error;

pub type MotionResult<T> = Result<T, MotionError>;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("motion service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("submission rejected: {0}")]
    SubmitRejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MotionError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MotionError::ServiceUnavailable(_) | MotionError::Network(_)
        )
    }
}
