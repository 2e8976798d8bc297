//! Shared data models for the Rescore backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job records (source videos, audio tracks, motion jobs, montage jobs)
//! - Status enums and their state-machine guards
//! - The montage source sum type
//! - Object-key derivation for stored artifacts

pub mod avatar;
pub mod montage;
pub mod motion;
pub mod track;
pub mod video;

// Re-export common types
pub use avatar::Avatar;
pub use montage::{MontageJob, MontageSource, MontageStatus};
pub use motion::{MotionJob, MotionStatus};
pub use track::{AudioTrack, TrackStatus};
pub use video::{SourceVideo, VideoStatus};

/// Upper bound for persisted error messages, in bytes.
///
/// Worker faults carry arbitrary tool output (ffmpeg/yt-dlp stderr); the
/// record keeps a readable prefix, never the full dump.
pub const MAX_ERROR_LOG_BYTES: usize = 2000;

/// Truncate an error message to [`MAX_ERROR_LOG_BYTES`] on a char boundary.
pub fn truncate_error_log(msg: &str) -> String {
    if msg.len() <= MAX_ERROR_LOG_BYTES {
        return msg.to_string();
    }
    let mut end = MAX_ERROR_LOG_BYTES;
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &msg[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_error_log_short_passthrough() {
        assert_eq!(truncate_error_log("boom"), "boom");
    }

    #[test]
    fn test_truncate_error_log_bounds() {
        let long = "x".repeat(10_000);
        let truncated = truncate_error_log(&long);
        assert!(truncated.len() <= MAX_ERROR_LOG_BYTES + '…'.len_utf8());
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_truncate_error_log_respects_char_boundary() {
        let long = "é".repeat(MAX_ERROR_LOG_BYTES);
        let truncated = truncate_error_log(&long);
        assert!(truncated.is_char_boundary(truncated.len()));
    }
}
