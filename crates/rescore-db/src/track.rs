//! Audio track repository.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use rescore_models::AudioTrack;

use crate::error::{DbError, DbResult};

const COLUMNS: &str =
    "id, name, artist, duration_seconds, storage_key, mime_type, size_bytes, status, created_at";

/// Fields supplied at upload time. The id is chosen by the caller so the
/// object key can be derived before the row exists.
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub id: Uuid,
    pub name: String,
    pub artist: Option<String>,
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

#[derive(Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new track in `processing`. A name collision surfaces as
    /// [`DbError::UniqueViolation`]; the caller must not have uploaded the
    /// blob yet (row first, blob second).
    #[tracing::instrument(skip(self, track), fields(track.name = %track.name))]
    pub async fn create(&self, track: &NewTrack) -> DbResult<AudioTrack> {
        let created = sqlx::query_as::<_, AudioTrack>(&format!(
            "INSERT INTO audio_tracks (id, name, artist, storage_key, mime_type, size_bytes, status)
             VALUES ($1, $2, $3, $4, $5, $6, 'processing')
             RETURNING {COLUMNS}"
        ))
        .bind(track.id)
        .bind(&track.name)
        .bind(&track.artist)
        .bind(&track.storage_key)
        .bind(&track.mime_type)
        .bind(track.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_sqlx(e, "track name already exists"))?;

        debug!(track_id = %created.id, "Audio track created");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<AudioTrack>> {
        let track = sqlx::query_as::<_, AudioTrack>(&format!(
            "SELECT {COLUMNS} FROM audio_tracks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    /// List active tracks, optionally filtered by a name/artist substring.
    pub async fn list_active(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<AudioTrack>> {
        let tracks = sqlx::query_as::<_, AudioTrack>(&format!(
            "SELECT {COLUMNS} FROM audio_tracks
             WHERE status = 'active'
               AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR artist ILIKE '%' || $1 || '%')
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(tracks)
    }

    /// Ingest success: record the probed duration and activate the track.
    #[tracing::instrument(skip(self))]
    pub async fn mark_active(
        &self,
        id: Uuid,
        duration_seconds: i32,
    ) -> DbResult<Option<AudioTrack>> {
        let track = sqlx::query_as::<_, AudioTrack>(&format!(
            "UPDATE audio_tracks
             SET status = 'active', duration_seconds = $2
             WHERE id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(duration_seconds)
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    /// Ingest failure: the upload could not be decoded.
    #[tracing::instrument(skip(self))]
    pub async fn mark_inactive(&self, id: Uuid) -> DbResult<Option<AudioTrack>> {
        let track = sqlx::query_as::<_, AudioTrack>(&format!(
            "UPDATE audio_tracks
             SET status = 'inactive'
             WHERE id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    /// Soft delete (tracks reuse `inactive` for deletion).
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE audio_tracks SET status = 'inactive' WHERE id = $1 AND status <> 'inactive'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compensating cleanup for a failed upload: remove the row entirely so
    /// a rejected record never tracks an absent blob.
    #[tracing::instrument(skip(self))]
    pub async fn delete_row(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM audio_tracks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
