//! Montage mux: re-score a video with a new audio track.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::{stderr_excerpt, MediaError, MediaResult};
use crate::probe::probe_duration;

/// Compose a montage: the video's own audio is replaced by `audio`.
///
/// Alignment contract: audio shorter than the video plays once and the
/// remainder is silence (`apad`, never looped); audio longer than or equal
/// to the video is truncated at the video's end (`-t`). The codec pair is
/// fixed (libx264/aac) so output is predictable.
pub async fn compose_montage(video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let video_duration = probe_duration(video).await?;
    let args = montage_args(video, audio, output, video_duration);

    debug!(
        video = %video.display(),
        audio = %audio.display(),
        video_duration,
        "Composing montage"
    );

    let result = Command::new("ffmpeg").args(&args).output().await?;

    if !result.status.success() {
        return Err(MediaError::FfmpegFailed {
            message: "montage mux failed".to_string(),
            stderr: Some(stderr_excerpt(&result.stderr)),
            exit_code: result.status.code(),
        });
    }

    if !output.exists() {
        return Err(MediaError::FfmpegFailed {
            message: "montage mux produced no file".to_string(),
            stderr: None,
            exit_code: result.status.code(),
        });
    }

    Ok(())
}

/// Build the ffmpeg argument list for the montage mux.
pub fn montage_args(video: &Path, audio: &Path, output: &Path, video_duration: f64) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-af".to_string(),
        "apad".to_string(),
        "-t".to_string(),
        format!("{video_duration:.3}"),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_for(duration: f64) -> Vec<String> {
        montage_args(
            &PathBuf::from("/tmp/in.mp4"),
            &PathBuf::from("/tmp/in.mp3"),
            &PathBuf::from("/tmp/out.mp4"),
            duration,
        )
    }

    #[test]
    fn test_output_is_bounded_by_video_duration() {
        // 40s audio against a 10s video: -t cuts the output (and the audio
        // stream with it) at the video's end.
        let args = args_for(10.0);
        let t_pos = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "10.000");
    }

    #[test]
    fn test_short_audio_is_padded_not_looped() {
        // 10s audio against a 30s video: apad extends the audio with
        // silence out to the -t cutoff; there is no loop filter.
        let args = args_for(30.0);
        let af_pos = args.iter().position(|a| a == "-af").unwrap();
        assert_eq!(args[af_pos + 1], "apad");
        assert!(!args.iter().any(|a| a.contains("aloop")));
    }

    #[test]
    fn test_fixed_codec_pair() {
        let args = args_for(12.5);
        let vcodec = args.iter().position(|a| a == "-c:v").unwrap();
        let acodec = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[vcodec + 1], "libx264");
        assert_eq!(args[acodec + 1], "aac");
    }

    #[test]
    fn test_maps_video_from_first_input_audio_from_second() {
        let args = args_for(5.0);
        let maps: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-map")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(maps, ["0:v:0", "1:a:0"]);
    }
}
