//! Source video models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a source-video acquisition job.
///
/// `pending → processing → {downloaded | failed}`; `deleted` is a soft
/// delete reachable from any state. Terminal states never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "video_status", rename_all = "snake_case")]
pub enum VideoStatus {
    Pending,
    Processing,
    Downloaded,
    Failed,
    Deleted,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Downloaded => "downloaded",
            VideoStatus::Failed => "failed",
            VideoStatus::Deleted => "deleted",
        }
    }

    /// Whether normal processing makes no further transition from here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VideoStatus::Downloaded | VideoStatus::Failed | VideoStatus::Deleted
        )
    }

    /// Whether the stored blob is usable as a montage or motion reference.
    pub fn is_ready(&self) -> bool {
        matches!(self, VideoStatus::Downloaded)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A remote video pulled into local custody by the acquisition worker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct SourceVideo {
    pub id: Uuid,

    /// The URL the video was requested from; dedup key among non-deleted rows.
    pub origin_url: String,

    /// Object key in the source-video bucket. Set iff status is `downloaded`.
    pub storage_key: Option<String>,

    /// Best-effort preview frame; may stay unset even for downloaded videos.
    pub thumbnail_key: Option<String>,

    pub status: VideoStatus,

    pub error_log: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl SourceVideo {
    /// Object key the acquisition worker uploads under. Derived from the job
    /// id, never from the remote filename.
    pub fn object_key(id: Uuid) -> String {
        format!("video_{id}.mp4")
    }

    /// Object key for the derived preview frame.
    pub fn thumbnail_object_key(id: Uuid) -> String {
        format!("thumb_video_{id}.jpg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!VideoStatus::Pending.is_terminal());
        assert!(!VideoStatus::Processing.is_terminal());
        assert!(VideoStatus::Downloaded.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
        assert!(VideoStatus::Deleted.is_terminal());
    }

    #[test]
    fn test_only_downloaded_is_ready() {
        for status in [
            VideoStatus::Pending,
            VideoStatus::Processing,
            VideoStatus::Failed,
            VideoStatus::Deleted,
        ] {
            assert!(!status.is_ready(), "{status} must not be ready");
        }
        assert!(VideoStatus::Downloaded.is_ready());
    }

    #[test]
    fn test_object_key_uses_id_not_filename() {
        let id = Uuid::new_v4();
        assert_eq!(SourceVideo::object_key(id), format!("video_{id}.mp4"));
    }
}
