//! Remote video acquisition via yt-dlp.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{stderr_excerpt, MediaError, MediaResult};

/// Download a remote video into `scratch_dir`, preferring an mp4 container
/// when the source offers a choice.
///
/// The output is keyed by `file_stem`, never by the remote filename. yt-dlp
/// may still pick a different extension when it merges formats; in that case
/// the single file that landed in the scratch dir is taken instead. The
/// only strong guarantee is at most one usable output per attempt.
pub async fn download_video(
    url: &str,
    scratch_dir: &Path,
    file_stem: &str,
) -> MediaResult<PathBuf> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let template = scratch_dir.join(format!("{file_stem}.%(ext)s"));
    let output = Command::new("yt-dlp")
        .arg("-f")
        .arg("best[ext=mp4]/best")
        .arg("--no-warnings")
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("-o")
        .arg(&template)
        .arg(url)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::DownloadFailed(format!(
            "yt-dlp exited with {}: {}",
            output.status,
            stderr_excerpt(&output.stderr)
        )));
    }

    let expected = scratch_dir.join(format!("{file_stem}.mp4"));
    let path = pick_output_file(scratch_dir, &expected)?;
    debug!(url, path = %path.display(), "Downloaded remote video");
    Ok(path)
}

/// Resolve the downloaded file: the expected path if present, otherwise
/// whatever single file yt-dlp left in the scratch directory.
pub fn pick_output_file(scratch_dir: &Path, expected: &Path) -> MediaResult<PathBuf> {
    if expected.exists() {
        return Ok(expected.to_path_buf());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(scratch_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    match files.len() {
        0 => Err(MediaError::NoOutputFile(scratch_dir.to_path_buf())),
        1 => Ok(files.remove(0)),
        n => {
            // More than one file should not happen; take the first and leave
            // a trace for debugging.
            warn!(
                dir = %scratch_dir.display(),
                count = n,
                "Multiple files in download scratch dir, taking the first"
            );
            Ok(files.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_output_file_prefers_expected() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("video.mp4");
        std::fs::write(&expected, b"v").unwrap();
        std::fs::write(dir.path().join("other.webm"), b"w").unwrap();

        let picked = pick_output_file(dir.path(), &expected).unwrap();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_pick_output_file_falls_back_to_landed_file() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("video.mp4");
        let landed = dir.path().join("video.webm");
        std::fs::write(&landed, b"w").unwrap();

        let picked = pick_output_file(dir.path(), &expected).unwrap();
        assert_eq!(picked, landed);
    }

    #[test]
    fn test_pick_output_file_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("video.mp4");

        let err = pick_output_file(dir.path(), &expected).unwrap_err();
        assert!(matches!(err, MediaError::NoOutputFile(_)));
    }
}
