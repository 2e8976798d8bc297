//! Motion generation job models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of an externally-generated motion video.
///
/// Unlike the other job types, the terminal transition is applied by the
/// inbound callback handler, not by the worker that created the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "motion_status", rename_all = "snake_case")]
pub enum MotionStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl MotionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionStatus::Pending => "pending",
            MotionStatus::Processing => "processing",
            MotionStatus::Success => "success",
            MotionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MotionStatus::Success | MotionStatus::Failed)
    }

    /// Whether the generated video can feed a montage.
    pub fn is_ready(&self) -> bool {
        matches!(self, MotionStatus::Success)
    }
}

impl fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A motion-generation job: avatar image animated with a reference clip by
/// the external service, correlated back via `external_job_id`.
///
/// Invariant: `status = success ⇔ result_video_key` is set. Re-hosting
/// failures downgrade the job to `failed` rather than leaving a success
/// record with no retrievable artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct MotionJob {
    pub id: Uuid,

    pub avatar_id: Uuid,

    pub reference_id: Uuid,

    /// Correlation key assigned by the external service; set in the same
    /// insert that creates the row so a callback can never race the commit.
    pub external_job_id: Option<String>,

    /// Local object key of the re-hosted result, never the external URL.
    pub result_video_key: Option<String>,

    pub result_thumbnail_key: Option<String>,

    pub status: MotionStatus,

    pub error_log: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl MotionJob {
    pub fn video_object_key(id: Uuid) -> String {
        format!("motion_{id}.mp4")
    }

    pub fn thumbnail_object_key(id: Uuid) -> String {
        format!("thumb_motion_{id}.jpg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!MotionStatus::Pending.is_terminal());
        assert!(!MotionStatus::Processing.is_terminal());
        assert!(MotionStatus::Success.is_terminal());
        assert!(MotionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&MotionStatus::Success).unwrap(),
            "\"success\""
        );
        let parsed: MotionStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, MotionStatus::Processing);
    }
}
