//! Montage API handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use rescore_models::{MontageJob, MontageSource, TrackStatus};
use rescore_queue::{ComposeMontageJob, QueueJob};
use rescore_storage::Bucket;

use super::{resolve_url, ListQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Montage creation request. `source` carries exactly one of `video_id` or
/// `motion_id`; anything else fails deserialization.
#[derive(Debug, Deserialize)]
pub struct CreateMontageRequest {
    pub source: MontageSource,
    pub track_id: Uuid,
}

/// Montage job response.
#[derive(Serialize)]
pub struct MontageResponse {
    pub id: Uuid,
    pub source: MontageSource,
    pub track_id: Uuid,
    pub status: rescore_models::MontageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) async fn montage_response(
    state: &AppState,
    job: MontageJob,
) -> ApiResult<MontageResponse> {
    let file_url = resolve_url(state, Bucket::Montages, job.result_key.as_deref()).await?;
    Ok(MontageResponse {
        id: job.id,
        source: job.source,
        track_id: job.track_id,
        status: job.status,
        error_log: job.error_log,
        file_url,
        created_at: job.created_at,
    })
}

/// Create a montage job.
///
/// Readiness is verified here so obviously doomed jobs are rejected
/// synchronously; the compositor re-verifies at execution time since the
/// artifacts can change between enqueue and run.
pub async fn create_montage(
    State(state): State<AppState>,
    Json(request): Json<CreateMontageRequest>,
) -> ApiResult<Json<MontageResponse>> {
    match &request.source {
        MontageSource::Video { video_id } => {
            let video = state
                .videos
                .get(*video_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Source video not found"))?;
            if !video.status.is_ready() || video.storage_key.is_none() {
                return Err(ApiError::conflict(format!(
                    "source video is {}, not ready for montage",
                    video.status
                )));
            }
        }
        MontageSource::Motion { motion_id } => {
            let motion = state
                .motions
                .get(*motion_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Motion video not found"))?;
            if !motion.status.is_ready() || motion.result_video_key.is_none() {
                return Err(ApiError::conflict(format!(
                    "motion video is {}, not ready for montage",
                    motion.status
                )));
            }
        }
    }

    let track = state
        .tracks
        .get(request.track_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Track not found"))?;
    if track.status != TrackStatus::Active {
        return Err(ApiError::conflict(format!(
            "track is {}, not active",
            track.status
        )));
    }

    let job = state.montages.create(&request.source, request.track_id).await?;

    if let Err(e) = state
        .queue
        .enqueue(QueueJob::ComposeMontage(ComposeMontageJob::new(job.id)))
        .await
    {
        warn!(montage_id = %job.id, error = %e, "Failed to enqueue montage, rolling back");
        if let Err(cleanup) = state.montages.delete_row(job.id).await {
            warn!(montage_id = %job.id, error = %cleanup, "Failed to roll back montage row");
        }
        return Err(e.into());
    }

    info!(montage_id = %job.id, source = job.source.kind(), "Montage job created");
    Ok(Json(montage_response(&state, job).await?))
}

/// List montages (failed ones are omitted).
pub async fn list_montages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<MontageResponse>>> {
    let jobs = state.montages.list(query.limit(), query.offset()).await?;

    let mut responses = Vec::with_capacity(jobs.len());
    for job in jobs {
        responses.push(montage_response(&state, job).await?);
    }
    Ok(Json(responses))
}

/// Get a montage by id.
pub async fn get_montage(
    State(state): State<AppState>,
    Path(montage_id): Path<Uuid>,
) -> ApiResult<Json<MontageResponse>> {
    let job = state
        .montages
        .get(montage_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Montage not found"))?;
    Ok(Json(montage_response(&state, job).await?))
}

/// Delete response.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Delete a montage and its rendered output.
pub async fn delete_montage(
    State(state): State<AppState>,
    Path(montage_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let job = state
        .montages
        .delete_row(montage_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Montage not found"))?;

    if let Some(result_key) = job.result_key {
        if let Err(e) = state.storage.delete(Bucket::Montages, &result_key).await {
            // Blob may already be gone.
            warn!(montage_id = %montage_id, error = %e, "Failed to delete montage blob");
        }
    }

    Ok(Json(DeleteResponse { deleted: true }))
}
