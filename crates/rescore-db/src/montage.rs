//! Montage job repository.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use rescore_models::{MontageJob, MontageSource};

use crate::error::DbResult;

const COLUMNS: &str =
    "id, source_video_id, motion_job_id, track_id, result_key, status, error_log, created_at";

#[derive(Clone)]
pub struct MontageRepository {
    pool: PgPool,
}

impl MontageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending montage. The sum type guarantees exactly one
    /// source branch; the table's CHECK constraint backs it at rest.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, source: &MontageSource, track_id: Uuid) -> DbResult<MontageJob> {
        let job = sqlx::query_as::<_, MontageJob>(&format!(
            "INSERT INTO montage_jobs (id, source_video_id, motion_job_id, track_id, status)
             VALUES ($1, $2, $3, $4, 'pending')
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(source.video_id())
        .bind(source.motion_id())
        .bind(track_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(montage_id = %job.id, source = source.kind(), "Montage job created");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<MontageJob>> {
        let job = sqlx::query_as::<_, MontageJob>(&format!(
            "SELECT {COLUMNS} FROM montage_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// List montages, excluding failed ones.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<MontageJob>> {
        let jobs = sqlx::query_as::<_, MontageJob>(&format!(
            "SELECT {COLUMNS} FROM montage_jobs
             WHERE status <> 'failed'
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Claim the job for a worker: `pending → processing`, atomic.
    #[tracing::instrument(skip(self))]
    pub async fn claim(&self, id: Uuid) -> DbResult<Option<MontageJob>> {
        let job = sqlx::query_as::<_, MontageJob>(&format!(
            "UPDATE montage_jobs
             SET status = 'processing'
             WHERE id = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Terminal success write; only valid from `processing`.
    #[tracing::instrument(skip(self))]
    pub async fn mark_completed(&self, id: Uuid, result_key: &str) -> DbResult<Option<MontageJob>> {
        let job = sqlx::query_as::<_, MontageJob>(&format!(
            "UPDATE montage_jobs
             SET status = 'completed', result_key = $2
             WHERE id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(result_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Terminal failure write; only valid from `processing`.
    #[tracing::instrument(skip(self, error_log))]
    pub async fn mark_failed(&self, id: Uuid, error_log: &str) -> DbResult<Option<MontageJob>> {
        let job = sqlx::query_as::<_, MontageJob>(&format!(
            "UPDATE montage_jobs
             SET status = 'failed', error_log = $2
             WHERE id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(error_log)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Hard delete, returning the removed row so the rendered blob can be
    /// cleaned up best-effort.
    #[tracing::instrument(skip(self))]
    pub async fn delete_row(&self, id: Uuid) -> DbResult<Option<MontageJob>> {
        let job = sqlx::query_as::<_, MontageJob>(&format!(
            "DELETE FROM montage_jobs WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }
}
