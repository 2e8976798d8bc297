//! Source video repository.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use rescore_models::SourceVideo;

use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, origin_url, storage_key, thumbnail_key, status, error_log, created_at";

#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending acquisition.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, origin_url: &str) -> DbResult<SourceVideo> {
        let video = sqlx::query_as::<_, SourceVideo>(&format!(
            "INSERT INTO source_videos (id, origin_url, status)
             VALUES ($1, $2, 'pending')
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(origin_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_sqlx(e, "origin url already tracked"))?;

        debug!(video_id = %video.id, "Source video created");
        Ok(video)
    }

    /// Dedup lookup: the most recent non-deleted record for this URL.
    pub async fn find_by_origin_url(&self, origin_url: &str) -> DbResult<Option<SourceVideo>> {
        let video = sqlx::query_as::<_, SourceVideo>(&format!(
            "SELECT {COLUMNS} FROM source_videos
             WHERE origin_url = $1 AND status <> 'deleted'
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(origin_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<SourceVideo>> {
        let video = sqlx::query_as::<_, SourceVideo>(&format!(
            "SELECT {COLUMNS} FROM source_videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<SourceVideo>> {
        let videos = sqlx::query_as::<_, SourceVideo>(&format!(
            "SELECT {COLUMNS} FROM source_videos
             WHERE status <> 'deleted'
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    /// Claim the job for a worker: `pending → processing` as one atomic
    /// write. Returns `None` when the row was already claimed, terminal, or
    /// deleted; the caller must skip, not retry.
    #[tracing::instrument(skip(self))]
    pub async fn claim(&self, id: Uuid) -> DbResult<Option<SourceVideo>> {
        let video = sqlx::query_as::<_, SourceVideo>(&format!(
            "UPDATE source_videos
             SET status = 'processing'
             WHERE id = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    /// Terminal success write; only valid from `processing`.
    #[tracing::instrument(skip(self))]
    pub async fn mark_downloaded(
        &self,
        id: Uuid,
        storage_key: &str,
        thumbnail_key: Option<&str>,
    ) -> DbResult<Option<SourceVideo>> {
        let video = sqlx::query_as::<_, SourceVideo>(&format!(
            "UPDATE source_videos
             SET status = 'downloaded', storage_key = $2, thumbnail_key = $3, error_log = NULL
             WHERE id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(storage_key)
        .bind(thumbnail_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    /// Terminal failure write; only valid from `processing`.
    #[tracing::instrument(skip(self, error_log))]
    pub async fn mark_failed(&self, id: Uuid, error_log: &str) -> DbResult<Option<SourceVideo>> {
        let video = sqlx::query_as::<_, SourceVideo>(&format!(
            "UPDATE source_videos
             SET status = 'failed', error_log = $2
             WHERE id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(error_log)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    /// Soft delete. The blob is not required to be purged.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE source_videos SET status = 'deleted' WHERE id = $1 AND status <> 'deleted'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
