//! Motion job repository.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use rescore_models::MotionJob;

use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, avatar_id, reference_id, external_job_id, result_video_key, \
                       result_thumbnail_key, status, error_log, created_at";

#[derive(Clone)]
pub struct MotionRepository {
    pool: PgPool,
}

impl MotionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotency lookup: an existing successful generation for the same
    /// avatar/reference pair is reused instead of resubmitting.
    pub async fn find_cached(
        &self,
        avatar_id: Uuid,
        reference_id: Uuid,
    ) -> DbResult<Option<MotionJob>> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "SELECT {COLUMNS} FROM motion_jobs
             WHERE avatar_id = $1 AND reference_id = $2 AND status = 'success'
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(avatar_id)
        .bind(reference_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Persist a freshly submitted job. The row is born `processing` with
    /// its external correlation id in the same insert, so a callback that
    /// arrives immediately after submission can already find it.
    #[tracing::instrument(skip(self))]
    pub async fn create_processing(
        &self,
        avatar_id: Uuid,
        reference_id: Uuid,
        external_job_id: &str,
    ) -> DbResult<MotionJob> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "INSERT INTO motion_jobs (id, avatar_id, reference_id, external_job_id, status)
             VALUES ($1, $2, $3, $4, 'processing')
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(avatar_id)
        .bind(reference_id)
        .bind(external_job_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_sqlx(e, "external job id already tracked"))?;

        debug!(motion_id = %job.id, external_job_id, "Motion job created");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<MotionJob>> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "SELECT {COLUMNS} FROM motion_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<MotionJob>> {
        let jobs = sqlx::query_as::<_, MotionJob>(&format!(
            "SELECT {COLUMNS} FROM motion_jobs
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Callback correlation lookup. Unknown ids are a normal outcome, not an
    /// error: the job may belong to another environment or have been deleted.
    pub async fn find_by_external_id(&self, external_job_id: &str) -> DbResult<Option<MotionJob>> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "SELECT {COLUMNS} FROM motion_jobs WHERE external_job_id = $1"
        ))
        .bind(external_job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Terminal success, applied at most once per external job id.
    ///
    /// The `status = 'processing'` guard makes redelivered callbacks a
    /// zero-row no-op; `None` tells the handler to answer
    /// "already-processed" without writing.
    #[tracing::instrument(skip(self))]
    pub async fn complete_success(
        &self,
        external_job_id: &str,
        result_video_key: &str,
        result_thumbnail_key: Option<&str>,
    ) -> DbResult<Option<MotionJob>> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "UPDATE motion_jobs
             SET status = 'success', result_video_key = $2, result_thumbnail_key = $3
             WHERE external_job_id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(external_job_id)
        .bind(result_video_key)
        .bind(result_thumbnail_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Terminal failure, same at-most-once guard as [`Self::complete_success`].
    #[tracing::instrument(skip(self, error_log))]
    pub async fn complete_failed(
        &self,
        external_job_id: &str,
        error_log: &str,
    ) -> DbResult<Option<MotionJob>> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "UPDATE motion_jobs
             SET status = 'failed', error_log = $2
             WHERE external_job_id = $1 AND status = 'processing'
             RETURNING {COLUMNS}"
        ))
        .bind(external_job_id)
        .bind(error_log)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Hard delete, returning the removed row so blobs can be cleaned up.
    #[tracing::instrument(skip(self))]
    pub async fn delete_row(&self, id: Uuid) -> DbResult<Option<MotionJob>> {
        let job = sqlx::query_as::<_, MotionJob>(&format!(
            "DELETE FROM motion_jobs WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }
}
