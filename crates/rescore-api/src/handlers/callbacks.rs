//! Inbound motion callback reconciliation.
//!
//! The external service pushes completion here; this handler is the only
//! writer that moves a MotionJob out of `processing`. Business outcomes
//! always answer HTTP 200 with a status token so the sender never enters a
//! retry storm; only a payload missing its correlation id is a client
//! error. Redelivered callbacks are no-ops by the repository's
//! `status = 'processing'` guard.

use std::path::Path;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use rescore_media::extract_thumbnail;
use rescore_models::{truncate_error_log, MotionJob};
use rescore_motion::{CallbackData, CallbackEnvelope};
use rescore_storage::Bucket;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Callback acknowledgment.
#[derive(Serialize)]
pub struct CallbackResponse {
    pub status: &'static str,
}

impl CallbackResponse {
    fn token(status: &'static str) -> Json<Self> {
        Json(Self { status })
    }
}

/// Apply an external completion notification.
pub async fn motion_callback(
    State(state): State<AppState>,
    Json(envelope): Json<CallbackEnvelope>,
) -> ApiResult<Json<CallbackResponse>> {
    if !envelope.is_delivered() {
        warn!(code = ?envelope.code, "Callback with non-200 code, ignoring");
        return Ok(CallbackResponse::token("ignored"));
    }

    let data = envelope
        .data
        .ok_or_else(|| ApiError::bad_request("callback carried no data"))?;
    let task_id = data
        .task_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("callback carried no task id"))?;

    let Some(job) = state.motions.find_by_external_id(&task_id).await? else {
        // May belong to another environment or a deleted job; acknowledge
        // without error.
        warn!(task_id, "Callback for unknown external job id");
        return Ok(CallbackResponse::token("unknown"));
    };

    if job.status.is_terminal() {
        info!(motion_id = %job.id, task_id, "Callback redelivered for terminal job");
        return Ok(CallbackResponse::token("already-processed"));
    }

    if data.is_success() {
        apply_success(&state, &job, &task_id, &data).await?;
    } else {
        let message = truncate_error_log(&data.failure_message());
        if state.motions.complete_failed(&task_id, &message).await?.is_some() {
            info!(motion_id = %job.id, task_id, "Motion generation failed");
        }
    }

    Ok(CallbackResponse::token("ok"))
}

/// Success leg: re-host the external result, then commit.
///
/// The external URL's lifetime is not guaranteed, so the result is pulled
/// into the motion-video bucket and the job records the LOCAL key. If
/// re-hosting fails or times out, the job is downgraded to `failed`, so a
/// `success` record always has a usable local artifact.
async fn apply_success(
    state: &AppState,
    job: &MotionJob,
    task_id: &str,
    data: &CallbackData,
) -> ApiResult<()> {
    let Some(result_url) = data.result_url() else {
        warn!(motion_id = %job.id, task_id, "Success callback without a result URL");
        state
            .motions
            .complete_failed(task_id, "success callback carried no result media URL")
            .await?;
        return Ok(());
    };

    let rehosted = tokio::time::timeout(
        state.config.rehost_timeout,
        rehost_result(state, job, &result_url),
    )
    .await;

    match rehosted {
        Ok(Ok((video_key, thumbnail_key))) => {
            if state
                .motions
                .complete_success(task_id, &video_key, thumbnail_key.as_deref())
                .await?
                .is_some()
            {
                info!(motion_id = %job.id, task_id, video_key, "Motion generation succeeded");
            }
        }
        Ok(Err(e)) => {
            warn!(motion_id = %job.id, task_id, error = %e, "Result re-hosting failed");
            state
                .motions
                .complete_failed(
                    task_id,
                    &truncate_error_log(&format!(
                        "generation succeeded but result re-hosting failed: {e}"
                    )),
                )
                .await?;
        }
        Err(_) => {
            warn!(motion_id = %job.id, task_id, "Result re-hosting timed out");
            state
                .motions
                .complete_failed(
                    task_id,
                    "generation succeeded but result re-hosting timed out",
                )
                .await?;
        }
    }

    Ok(())
}

/// Download the external result and upload it into local custody, with a
/// best-effort thumbnail.
async fn rehost_result(
    state: &AppState,
    job: &MotionJob,
    result_url: &str,
) -> ApiResult<(String, Option<String>)> {
    let scratch = state.config.scratch_dir.join(format!("callback_{}", job.id));
    tokio::fs::create_dir_all(&scratch)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let outcome = rehost_inner(state, job, result_url, &scratch).await;

    if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %scratch.display(), error = %e, "Failed to remove callback scratch dir");
        }
    }

    outcome
}

async fn rehost_inner(
    state: &AppState,
    job: &MotionJob,
    result_url: &str,
    scratch: &Path,
) -> ApiResult<(String, Option<String>)> {
    let response = state
        .http
        .get(result_url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ApiError::internal(format!("result download failed: {e}")))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::internal(format!("result download failed: {e}")))?;

    let video_local = scratch.join("result.mp4");
    tokio::fs::write(&video_local, &bytes)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let video_key = MotionJob::video_object_key(job.id);
    state
        .storage
        .upload_file(Bucket::MotionVideos, &video_key, &video_local, "video/mp4")
        .await?;

    // Thumbnail is best-effort.
    let thumbnail_key = match derive_thumbnail(state, job, &video_local, scratch).await {
        Ok(key) => Some(key),
        Err(e) => {
            warn!(motion_id = %job.id, error = %e, "Motion thumbnail extraction failed");
            None
        }
    };

    Ok((video_key, thumbnail_key))
}

async fn derive_thumbnail(
    state: &AppState,
    job: &MotionJob,
    video_local: &Path,
    scratch: &Path,
) -> ApiResult<String> {
    let thumb_local = scratch.join("thumbnail.jpg");
    extract_thumbnail(video_local, &thumb_local)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let thumbnail_key = MotionJob::thumbnail_object_key(job.id);
    state
        .storage
        .upload_file(
            Bucket::MotionVideos,
            &thumbnail_key,
            &thumb_local,
            "image/jpeg",
        )
        .await?;
    Ok(thumbnail_key)
}
