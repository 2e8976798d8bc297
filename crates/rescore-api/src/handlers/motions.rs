//! Motion generation API handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use rescore_models::MotionJob;
use rescore_storage::Bucket;

use super::{resolve_url, ListQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Motion creation request.
#[derive(Debug, Deserialize)]
pub struct CreateMotionRequest {
    pub avatar_id: Uuid,
    pub reference_id: Uuid,
}

/// Motion job response.
#[derive(Serialize)]
pub struct MotionResponse {
    pub id: Uuid,
    pub avatar_id: Uuid,
    pub reference_id: Uuid,
    pub status: rescore_models::MotionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) async fn motion_response(state: &AppState, job: MotionJob) -> ApiResult<MotionResponse> {
    let video_url =
        resolve_url(state, Bucket::MotionVideos, job.result_video_key.as_deref()).await?;
    let thumbnail_url =
        resolve_url(state, Bucket::MotionVideos, job.result_thumbnail_key.as_deref()).await?;
    Ok(MotionResponse {
        id: job.id,
        avatar_id: job.avatar_id,
        reference_id: job.reference_id,
        status: job.status,
        external_job_id: job.external_job_id,
        error_log: job.error_log,
        video_url,
        thumbnail_url,
        created_at: job.created_at,
    })
}

/// Create a motion generation job.
///
/// Idempotent per `(avatar_id, reference_id)`: an existing successful
/// generation is returned unchanged, with no second external submission.
/// The external submission happens before any row is persisted; if it
/// fails, nothing is recorded and the client retries the whole creation.
pub async fn create_motion(
    State(state): State<AppState>,
    Json(request): Json<CreateMotionRequest>,
) -> ApiResult<Json<MotionResponse>> {
    if let Some(cached) = state
        .motions
        .find_cached(request.avatar_id, request.reference_id)
        .await?
    {
        info!(motion_id = %cached.id, "Reusing cached motion generation");
        return Ok(Json(motion_response(&state, cached).await?));
    }

    let avatar = state
        .avatars
        .get(request.avatar_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Avatar not found"))?;

    let reference = state
        .videos
        .get(request.reference_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reference video not found"))?;

    // A reference that is still mid-acquisition has no resolvable artifact
    // yet; reject with a clear precondition error instead of submitting a
    // bad URL.
    let reference_key = match (&reference.status, reference.storage_key.as_deref()) {
        (status, Some(key)) if status.is_ready() => key.to_string(),
        (status, _) => {
            return Err(ApiError::conflict(format!(
                "reference video is {status}, not downloaded"
            )));
        }
    };

    let avatar_url = state
        .storage
        .presign_get(Bucket::Avatars, &avatar.storage_key, state.config.presign_ttl)
        .await?;
    let reference_url = state
        .storage
        .presign_get(Bucket::SourceVideos, &reference_key, state.config.presign_ttl)
        .await?;

    let external_job_id = state
        .motion_client
        .submit(&avatar_url, &reference_url)
        .await?;

    let job = state
        .motions
        .create_processing(request.avatar_id, request.reference_id, &external_job_id)
        .await?;

    info!(motion_id = %job.id, external_job_id, "Motion generation submitted");
    Ok(Json(motion_response(&state, job).await?))
}

/// List motion jobs.
pub async fn list_motions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<MotionResponse>>> {
    let jobs = state.motions.list(query.limit(), query.offset()).await?;

    let mut responses = Vec::with_capacity(jobs.len());
    for job in jobs {
        responses.push(motion_response(&state, job).await?);
    }
    Ok(Json(responses))
}

/// Get a motion job by id.
pub async fn get_motion(
    State(state): State<AppState>,
    Path(motion_id): Path<Uuid>,
) -> ApiResult<Json<MotionResponse>> {
    let job = state
        .motions
        .get(motion_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Motion not found"))?;
    Ok(Json(motion_response(&state, job).await?))
}

/// Delete response.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Delete a motion job and its re-hosted artifacts.
pub async fn delete_motion(
    State(state): State<AppState>,
    Path(motion_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let job = state
        .motions
        .delete_row(motion_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Motion not found"))?;

    for key in [job.result_video_key, job.result_thumbnail_key]
        .into_iter()
        .flatten()
    {
        if let Err(e) = state.storage.delete(Bucket::MotionVideos, &key).await {
            warn!(motion_id = %motion_id, key, error = %e, "Failed to delete motion blob");
        }
    }

    Ok(Json(DeleteResponse { deleted: true }))
}
