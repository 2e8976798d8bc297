//! Avatar API handlers.

use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use rescore_models::Avatar;
use rescore_storage::Bucket;

use super::{resolve_url, ListQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Avatar response.
#[derive(Serialize)]
pub struct AvatarResponse {
    pub id: Uuid,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

async fn avatar_response(state: &AppState, avatar: Avatar) -> ApiResult<AvatarResponse> {
    let file_url = resolve_url(state, Bucket::Avatars, Some(&avatar.storage_key)).await?;
    Ok(AvatarResponse {
        id: avatar.id,
        content_type: avatar.content_type,
        file_url,
        created_at: avatar.created_at,
    })
}

/// Upload an avatar image.
pub async fn upload_avatar(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AvatarResponse>> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
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
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::bad_request("file is required"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("file is empty"));
    }
    if bytes.len() > state.config.max_avatar_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "file exceeds {} bytes",
            state.config.max_avatar_bytes
        )));
    }

    let content_type =
        content_type.ok_or_else(|| ApiError::bad_request("file content type is required"))?;
    if !content_type.starts_with("image/") {
        return Err(ApiError::bad_request("avatar must be an image"));
    }

    let id = Uuid::new_v4();
    let extension = filename
        .as_deref()
        .and_then(|f| FsPath::new(f).extension())
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    let storage_key = Avatar::object_key(id, extension);

    state
        .storage
        .upload_bytes(Bucket::Avatars, &storage_key, bytes, &content_type)
        .await?;

    let avatar = match state.avatars.create(id, &storage_key, &content_type).await {
        Ok(avatar) => avatar,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(Bucket::Avatars, &storage_key).await {
                warn!(avatar_id = %id, error = %cleanup, "Failed to delete orphaned avatar blob");
            }
            return Err(e.into());
        }
    };

    Ok(Json(avatar_response(&state, avatar).await?))
}

/// List avatars.
pub async fn list_avatars(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AvatarResponse>>> {
    let avatars = state.avatars.list(query.limit(), query.offset()).await?;

    let mut responses = Vec::with_capacity(avatars.len());
    for avatar in avatars {
        responses.push(avatar_response(&state, avatar).await?);
    }
    Ok(Json(responses))
}

/// Get an avatar by id.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(avatar_id): Path<Uuid>,
) -> ApiResult<Json<AvatarResponse>> {
    let avatar = state
        .avatars
        .get(avatar_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Avatar not found"))?;
    Ok(Json(avatar_response(&state, avatar).await?))
}

/// Delete response.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Delete an avatar and its stored image.
pub async fn delete_avatar(
    State(state): State<AppState>,
    Path(avatar_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let avatar = state
        .avatars
        .delete_row(avatar_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Avatar not found"))?;

    if let Err(e) = state.storage.delete(Bucket::Avatars, &avatar.storage_key).await {
        // Blob may already be gone.
        warn!(avatar_id = %avatar_id, error = %e, "Failed to delete avatar blob");
    }

    Ok(Json(DeleteResponse { deleted: true }))
}
