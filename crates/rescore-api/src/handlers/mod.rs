//! API handlers.

pub mod avatars;
pub mod callbacks;
pub mod health;
pub mod montages;
pub mod motions;
pub mod tracks;
pub mod videos;

use serde::Deserialize;

use rescore_storage::Bucket;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolve an optional storage key to a presigned URL.
pub(crate) async fn resolve_url(
    state: &AppState,
    bucket: Bucket,
    key: Option<&str>,
) -> ApiResult<Option<String>> {
    match key {
        Some(key) => {
            let url = state
                .storage
                .presign_get(bucket, key, state.config.presign_ttl)
                .await?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

/// Common list query parameters.
#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
