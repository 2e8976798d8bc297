//! Source video API handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use rescore_db::DbError;
use rescore_models::SourceVideo;
use rescore_queue::{AcquireVideoJob, QueueJob};
use rescore_storage::Bucket;

use super::{resolve_url, ListQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Acquisition request: a batch of remote video URLs.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideosRequest {
    #[validate(length(min = 1, max = 20, message = "between 1 and 20 urls per request"))]
    pub urls: Vec<String>,
}

/// Source video response.
#[derive(Serialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub origin_url: String,
    pub status: rescore_models::VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) async fn video_response(
    state: &AppState,
    video: SourceVideo,
) -> ApiResult<VideoResponse> {
    let file_url = resolve_url(state, Bucket::SourceVideos, video.storage_key.as_deref()).await?;
    let thumbnail_url =
        resolve_url(state, Bucket::SourceVideos, video.thumbnail_key.as_deref()).await?;
    Ok(VideoResponse {
        id: video.id,
        origin_url: video.origin_url,
        status: video.status,
        error_log: video.error_log,
        file_url,
        thumbnail_url,
        created_at: video.created_at,
    })
}

/// Request acquisition of one or more remote videos.
///
/// Idempotent per URL: an already-known non-deleted URL returns its existing
/// record without enqueueing a second download.
pub async fn create_videos(
    State(state): State<AppState>,
    Json(request): Json<CreateVideosRequest>,
) -> ApiResult<Json<Vec<VideoResponse>>> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let mut responses = Vec::with_capacity(request.urls.len());

    for raw_url in &request.urls {
        let url = raw_url.trim();
        let parsed = reqwest::Url::parse(url)
            .map_err(|_| ApiError::bad_request(format!("invalid url: {url}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::bad_request(format!(
                "unsupported url scheme: {}",
                parsed.scheme()
            )));
        }

        if let Some(existing) = state.videos.find_by_origin_url(url).await? {
            responses.push(video_response(&state, existing).await?);
            continue;
        }

        let video = match state.videos.create(url).await {
            Ok(video) => {
                state
                    .queue
                    .enqueue(QueueJob::AcquireVideo(AcquireVideoJob::new(video.id)))
                    .await?;
                video
            }
            // Lost a concurrent-create race; the other request's record owns
            // the download.
            Err(DbError::UniqueViolation(_)) => state
                .videos
                .find_by_origin_url(url)
                .await?
                .ok_or_else(|| ApiError::internal("video vanished after dedup conflict"))?,
            Err(e) => return Err(e.into()),
        };

        responses.push(video_response(&state, video).await?);
    }

    Ok(Json(responses))
}

/// List non-deleted videos.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<VideoResponse>>> {
    let videos = state.videos.list(query.limit(), query.offset()).await?;

    let mut responses = Vec::with_capacity(videos.len());
    for video in videos {
        responses.push(video_response(&state, video).await?);
    }
    Ok(Json(responses))
}

/// Get a video by id.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<Json<VideoResponse>> {
    let video = state
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    Ok(Json(video_response(&state, video).await?))
}

/// Delete video response.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Soft-delete a video.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.videos.soft_delete(video_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Video not found"));
    }
    Ok(Json(DeleteResponse { deleted: true }))
}
