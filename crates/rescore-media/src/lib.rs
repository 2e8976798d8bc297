//! CLI wrappers for media tooling.
//!
//! This crate provides:
//! - Remote video acquisition via yt-dlp, with the loose "pick whatever
//!   landed" scratch-dir fallback
//! - Duration probing via ffprobe
//! - Best-effort thumbnail extraction via ffmpeg
//! - The montage mux (fixed libx264/aac pair, silence-padded or truncated
//!   audio)

pub mod download;
pub mod error;
pub mod montage;
pub mod probe;
pub mod thumbnail;

pub use download::{download_video, pick_output_file};
pub use error::{MediaError, MediaResult};
pub use montage::{compose_montage, montage_args};
pub use probe::probe_duration;
pub use thumbnail::extract_thumbnail;
