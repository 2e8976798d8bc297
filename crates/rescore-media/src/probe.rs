//! Media duration probing via ffprobe.

use std::path::Path;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{stderr_excerpt, MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the container duration of a media file, in seconds.
///
/// Works for both audio and video; a file ffprobe cannot parse (or one
/// without a duration, e.g. a bare stream) is an error.
pub async fn probe_duration(path: &Path) -> MediaResult<f64> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_format")
        .arg("-of")
        .arg("json")
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe exited with {}", output.status),
            stderr: Some(stderr_excerpt(&output.stderr)),
        });
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::InvalidDuration(path.display().to_string()))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::InvalidDuration(format!(
            "{}: {duration}",
            path.display()
        )));
    }

    Ok(duration)
}
