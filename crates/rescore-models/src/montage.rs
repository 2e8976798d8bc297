//! Montage job models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a montage (compositing) job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "montage_status", rename_all = "snake_case")]
pub enum MontageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl MontageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MontageStatus::Pending => "pending",
            MontageStatus::Processing => "processing",
            MontageStatus::Completed => "completed",
            MontageStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MontageStatus::Completed | MontageStatus::Failed)
    }
}

impl fmt::Display for MontageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The video input of a montage: exactly one of a directly acquired source
/// video or a generated motion video.
///
/// A sum type rather than two nullable foreign keys, so "both set" and
/// "neither set" are unrepresentable. Deserialization rejects bodies
/// carrying both ids or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged, deny_unknown_fields)]
pub enum MontageSource {
    Video { video_id: Uuid },
    Motion { motion_id: Uuid },
}

impl MontageSource {
    pub fn video_id(&self) -> Option<Uuid> {
        match self {
            MontageSource::Video { video_id } => Some(*video_id),
            MontageSource::Motion { .. } => None,
        }
    }

    pub fn motion_id(&self) -> Option<Uuid> {
        match self {
            MontageSource::Video { .. } => None,
            MontageSource::Motion { motion_id } => Some(*motion_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MontageSource::Video { .. } => "video",
            MontageSource::Motion { .. } => "motion",
        }
    }
}

/// A compositing job: one ready video artifact re-scored with one ready
/// audio track.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MontageJob {
    pub id: Uuid,

    pub source: MontageSource,

    pub track_id: Uuid,

    /// Object key of the rendered output. Set iff status is `completed`.
    pub result_key: Option<String>,

    pub status: MontageStatus,

    pub error_log: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl MontageJob {
    pub fn object_key(id: Uuid) -> String {
        format!("montage_{id}.mp4")
    }
}

// The table backs the sum type with two nullable columns plus a CHECK
// constraint; decoding re-asserts the exactly-one invariant.
impl<'r> sqlx::FromRow<'r, PgRow> for MontageJob {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let video_id: Option<Uuid> = row.try_get("source_video_id")?;
        let motion_id: Option<Uuid> = row.try_get("motion_job_id")?;

        let source = match (video_id, motion_id) {
            (Some(video_id), None) => MontageSource::Video { video_id },
            (None, Some(motion_id)) => MontageSource::Motion { motion_id },
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "source_video_id".into(),
                    source: "montage row must reference exactly one video source".into(),
                });
            }
        };

        Ok(Self {
            id: row.try_get("id")?,
            source,
            track_id: row.try_get("track_id")?,
            result_key: row.try_get("result_key")?,
            status: row.try_get("status")?,
            error_log: row.try_get("error_log")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_deserializes_single_branch() {
        let video_id = Uuid::new_v4();
        let source: MontageSource =
            serde_json::from_value(serde_json::json!({ "video_id": video_id })).unwrap();
        assert_eq!(source, MontageSource::Video { video_id });
        assert_eq!(source.video_id(), Some(video_id));
        assert_eq!(source.motion_id(), None);

        let motion_id = Uuid::new_v4();
        let source: MontageSource =
            serde_json::from_value(serde_json::json!({ "motion_id": motion_id })).unwrap();
        assert_eq!(source, MontageSource::Motion { motion_id });
    }

    #[test]
    fn test_source_rejects_both_branches() {
        let body = serde_json::json!({
            "video_id": Uuid::new_v4(),
            "motion_id": Uuid::new_v4(),
        });
        assert!(serde_json::from_value::<MontageSource>(body).is_err());
    }

    #[test]
    fn test_source_rejects_empty_body() {
        assert!(serde_json::from_value::<MontageSource>(serde_json::json!({})).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MontageStatus::Pending.is_terminal());
        assert!(!MontageStatus::Processing.is_terminal());
        assert!(MontageStatus::Completed.is_terminal());
        assert!(MontageStatus::Failed.is_terminal());
    }
}
