//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scratch directory for per-job working files.
    pub work_dir: PathBuf,
    /// Max jobs processed concurrently by this instance.
    pub max_concurrent_jobs: usize,
    /// Consumer name within the queue's consumer group.
    pub consumer_name: String,
    /// How long a dequeue blocks waiting for a message.
    pub dequeue_block: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("rescore-work"),
            max_concurrent_jobs: 4,
            consumer_name: format!("worker-{}", std::process::id()),
            dequeue_block: Duration::from_millis(5000),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_concurrent_jobs: std::env::var("WORKER_MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_jobs),
            consumer_name: std::env::var("WORKER_CONSUMER_NAME")
                .unwrap_or(defaults.consumer_name),
            dequeue_block: Duration::from_millis(
                std::env::var("WORKER_DEQUEUE_BLOCK_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
        }
    }
}
