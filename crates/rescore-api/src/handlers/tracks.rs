//! Audio track API handlers.

use std::net::SocketAddr;
use std::path::Path as FsPath;

use axum::extract::{ConnectInfo, Multipart, Path, Query, State};
use axum::Json;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use rescore_db::NewTrack;
use rescore_models::AudioTrack;
use rescore_queue::{IngestTrackJob, QueueJob};
use rescore_storage::Bucket;

use super::{resolve_url, ListQuery};
use crate::error::{ApiError, ApiResult};
use crate::rate_limit;
use crate::state::AppState;

const ALLOWED_AUDIO_MIME: &[&str] = &["audio/mpeg", "audio/mp3", "audio/wav", "audio/x-wav"];

/// Audio track response.
#[derive(Serialize)]
pub struct TrackResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i32>,
    pub status: rescore_models::TrackStatus,
    pub size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) async fn track_response(state: &AppState, track: AudioTrack) -> ApiResult<TrackResponse> {
    let file_url = resolve_url(state, Bucket::Audio, Some(&track.storage_key)).await?;
    let size_mb = track.size_mb();
    Ok(TrackResponse {
        id: track.id,
        name: track.name,
        artist: track.artist,
        duration_seconds: track.duration_seconds,
        status: track.status,
        size_mb,
        file_url,
        created_at: track.created_at,
    })
}

/// Upload a new audio track.
///
/// Order matters: the row is inserted before the blob is uploaded, so a name
/// collision rejects the request with nothing stored; a failed upload rolls
/// the row back again.
pub async fn upload_track(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut multipart: Multipart,
) -> ApiResult<Json<TrackResponse>> {
    rate_limit::check(&state.upload_limiter, addr.ip())?;

    let mut name: Option<String> = None;
    let mut artist: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                )
            }
            Some("artist") => {
                artist = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                )
            }
            Some("file") => {
                content_type = field.content_type().map(str::to_string);
                filename = field.file_name().map(str::to_string);
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required"))?;
    if name.len() > 255 {
        return Err(ApiError::bad_request("name is limited to 255 characters"));
    }
    let artist = artist.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());

    let bytes = file_bytes.ok_or_else(|| ApiError::bad_request("file is required"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("file is empty"));
    }
    if bytes.len() > state.config.max_track_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "file exceeds {} bytes",
            state.config.max_track_bytes
        )));
    }

    let content_type =
        content_type.ok_or_else(|| ApiError::bad_request("file content type is required"))?;
    if !ALLOWED_AUDIO_MIME.contains(&content_type.as_str()) {
        return Err(ApiError::bad_request(
            "invalid file type, only MP3/WAV is accepted",
        ));
    }

    let id = Uuid::new_v4();
    let extension = filename
        .as_deref()
        .and_then(|f| FsPath::new(f).extension())
        .and_then(|e| e.to_str())
        .unwrap_or(if content_type.contains("wav") { "wav" } else { "mp3" });
    let storage_key = AudioTrack::object_key(id, extension);

    let track = state
        .tracks
        .create(&NewTrack {
            id,
            name,
            artist,
            storage_key: storage_key.clone(),
            mime_type: content_type.clone(),
            size_bytes: bytes.len() as i64,
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::conflict("track name already exists")
            } else {
                e.into()
            }
        })?;

    if let Err(e) = state
        .storage
        .upload_bytes(Bucket::Audio, &storage_key, bytes, &content_type)
        .await
    {
        // The blob never landed; remove the row so nothing tracks it.
        if let Err(cleanup) = state.tracks.delete_row(id).await {
            warn!(track_id = %id, error = %cleanup, "Failed to roll back track row");
        }
        return Err(e.into());
    }

    if let Err(e) = state
        .queue
        .enqueue(QueueJob::IngestTrack(IngestTrackJob::new(id)))
        .await
    {
        warn!(track_id = %id, error = %e, "Failed to enqueue ingest, rolling back upload");
        if let Err(cleanup) = state.storage.delete(Bucket::Audio, &storage_key).await {
            warn!(track_id = %id, error = %cleanup, "Failed to delete orphaned blob");
        }
        if let Err(cleanup) = state.tracks.delete_row(id).await {
            warn!(track_id = %id, error = %cleanup, "Failed to roll back track row");
        }
        return Err(e.into());
    }

    Ok(Json(track_response(&state, track).await?))
}

/// List active tracks, optionally filtered by name/artist substring.
pub async fn list_tracks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<TrackResponse>>> {
    let tracks = state
        .tracks
        .list_active(query.search.as_deref(), query.limit(), query.offset())
        .await?;

    let mut responses = Vec::with_capacity(tracks.len());
    for track in tracks {
        responses.push(track_response(&state, track).await?);
    }
    Ok(Json(responses))
}

/// Get a track by id.
pub async fn get_track(
    State(state): State<AppState>,
    Path(track_id): Path<Uuid>,
) -> ApiResult<Json<TrackResponse>> {
    let track = state
        .tracks
        .get(track_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Track not found"))?;
    Ok(Json(track_response(&state, track).await?))
}

/// Delete track response.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Soft-delete a track.
pub async fn delete_track(
    State(state): State<AppState>,
    Path(track_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.tracks.soft_delete(track_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Track not found"));
    }
    Ok(Json(DeleteResponse { deleted: true }))
}
