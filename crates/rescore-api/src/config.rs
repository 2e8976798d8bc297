//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    /// Max accepted audio upload size, in bytes.
    pub max_track_bytes: usize,
    /// Max accepted avatar upload size, in bytes.
    pub max_avatar_bytes: usize,
    /// Track uploads allowed per client IP per minute.
    pub uploads_per_minute: u32,
    /// Lifetime of presigned artifact URLs.
    pub presign_ttl: Duration,
    /// Hard ceiling for the callback's result re-hosting step.
    pub rehost_timeout: Duration,
    /// Scratch directory for callback re-hosting files.
    pub scratch_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["*".to_string()],
            max_track_bytes: 50 * 1024 * 1024,
            max_avatar_bytes: 200 * 1024 * 1024,
            uploads_per_minute: 5,
            presign_ttl: Duration::from_secs(3600),
            rehost_timeout: Duration::from_secs(120),
            scratch_dir: std::env::temp_dir().join("rescore-api"),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("API_BIND_ADDR").unwrap_or(defaults.bind_addr),
            cors_origins: std::env::var("API_CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            max_track_bytes: std::env::var("API_MAX_TRACK_MB")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_track_bytes),
            max_avatar_bytes: std::env::var("API_MAX_AVATAR_MB")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_avatar_bytes),
            uploads_per_minute: std::env::var("API_UPLOADS_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.uploads_per_minute),
            presign_ttl: Duration::from_secs(
                std::env::var("API_PRESIGN_TTL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            rehost_timeout: Duration::from_secs(
                std::env::var("CALLBACK_REHOST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            scratch_dir: std::env::var("API_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
        }
    }
}
