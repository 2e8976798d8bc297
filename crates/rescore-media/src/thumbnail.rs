//! Thumbnail extraction via ffmpeg.

use std::path::Path;

use tokio::process::Command;

use crate::error::{stderr_excerpt, MediaError, MediaResult};

/// Extract the first frame of a video as a JPEG.
///
/// Callers treat this as best-effort: a failed extraction must not fail the
/// surrounding job.
pub async fn extract_thumbnail(video: &Path, output: &Path) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video)
        .arg("-frames:v")
        .arg("1")
        .arg("-q:v")
        .arg("2")
        .arg(output)
        .output()
        .await?;

    if !result.status.success() {
        return Err(MediaError::FfmpegFailed {
            message: "thumbnail extraction failed".to_string(),
            stderr: Some(stderr_excerpt(&result.stderr)),
            exit_code: result.status.code(),
        });
    }

    if !output.exists() {
        return Err(MediaError::FfmpegFailed {
            message: "thumbnail extraction produced no file".to_string(),
            stderr: None,
            exit_code: result.status.code(),
        });
    }

    Ok(())
}
