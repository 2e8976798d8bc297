//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("database error: {0}")]
    Db(#[from] rescore_db::DbError),

    #[error("storage error: {0}")]
    Storage(#[from] rescore_storage::StorageError),

    #[error("media error: {0}")]
    Media(#[from] rescore_media::MediaError),

    #[error("queue error: {0}")]
    Queue(#[from] rescore_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
