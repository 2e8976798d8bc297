//! Audio track models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of an uploaded audio track.
///
/// Tracks are created `processing`; the ingest worker probes the duration
/// and settles them as `active`, or `inactive` when the file cannot be
/// decoded. `inactive` doubles as the soft-delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "track_status", rename_all = "snake_case")]
pub enum TrackStatus {
    Processing,
    Active,
    Inactive,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Processing => "processing",
            TrackStatus::Active => "active",
            TrackStatus::Inactive => "inactive",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackStatus::Active | TrackStatus::Inactive)
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An uploaded audio track and its probed metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct AudioTrack {
    pub id: Uuid,

    /// Human key, unique across non-deleted and deleted tracks alike.
    pub name: String,

    pub artist: Option<String>,

    /// Probed by the ingest worker; unset while `processing` or when the
    /// probe failed.
    pub duration_seconds: Option<i32>,

    pub storage_key: String,

    pub mime_type: String,

    pub size_bytes: i64,

    pub status: TrackStatus,

    pub created_at: DateTime<Utc>,
}

impl AudioTrack {
    /// Object key in the audio bucket, re-keyed by id with the upload's
    /// extension.
    pub fn object_key(id: Uuid, extension: &str) -> String {
        format!("audio_{id}.{extension}")
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_is_not_terminal() {
        assert!(!TrackStatus::Processing.is_terminal());
        assert!(TrackStatus::Active.is_terminal());
        assert!(TrackStatus::Inactive.is_terminal());
    }
}
