//! Job types for the queue.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job to acquire a remote source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireVideoJob {
    /// Source video record to process.
    pub video_id: Uuid,
}

impl AcquireVideoJob {
    pub fn new(video_id: Uuid) -> Self {
        Self { video_id }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("acquire:{}", self.video_id)
    }
}

/// Job to validate an uploaded audio track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestTrackJob {
    /// Track record to process.
    pub track_id: Uuid,
}

impl IngestTrackJob {
    pub fn new(track_id: Uuid) -> Self {
        Self { track_id }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("ingest:{}", self.track_id)
    }
}

/// Job to composite a montage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeMontageJob {
    /// Montage record to process.
    pub montage_id: Uuid,
}

impl ComposeMontageJob {
    pub fn new(montage_id: Uuid) -> Self {
        Self { montage_id }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("compose:{}", self.montage_id)
    }
}

/// Generic job wrapper for queue storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    AcquireVideo(AcquireVideoJob),
    IngestTrack(IngestTrackJob),
    ComposeMontage(ComposeMontageJob),
}

impl QueueJob {
    /// Id of the job record this message addresses.
    pub fn record_id(&self) -> Uuid {
        match self {
            QueueJob::AcquireVideo(j) => j.video_id,
            QueueJob::IngestTrack(j) => j.track_id,
            QueueJob::ComposeMontage(j) => j.montage_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QueueJob::AcquireVideo(_) => "acquire_video",
            QueueJob::IngestTrack(_) => "ingest_track",
            QueueJob::ComposeMontage(_) => "compose_montage",
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::AcquireVideo(j) => j.idempotency_key(),
            QueueJob::IngestTrack(j) => j.idempotency_key(),
            QueueJob::ComposeMontage(j) => j.idempotency_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_job_serde_tag() {
        let job = QueueJob::AcquireVideo(AcquireVideoJob::new(Uuid::new_v4()));
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["type"], "acquire_video");

        let parsed: QueueJob = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.record_id(), job.record_id());
    }

    #[test]
    fn test_idempotency_keys_are_kind_scoped() {
        let id = Uuid::new_v4();
        let acquire = QueueJob::AcquireVideo(AcquireVideoJob::new(id));
        let ingest = QueueJob::IngestTrack(IngestTrackJob::new(id));
        assert_ne!(acquire.idempotency_key(), ingest.idempotency_key());
    }
}
