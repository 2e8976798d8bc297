//! Job processing logic.
//!
//! Every processor follows the same contract: claim the record with an
//! atomic `pending → processing` write before any external I/O, run the
//! fallible work in an inner function, and terminalize the record on both
//! branches. A record is never left in `processing` by a handled fault, and
//! scratch files are removed on every exit path.

use std::path::Path;

use tracing::{debug, info, warn};

use rescore_db::{
    DbConfig, MontageRepository, MotionRepository, TrackRepository, VideoRepository,
};
use rescore_media::{compose_montage, download_video, extract_thumbnail, probe_duration};
use rescore_models::{
    truncate_error_log, AudioTrack, MontageJob, MontageSource, MotionJob, SourceVideo,
    TrackStatus,
};
use rescore_queue::{AcquireVideoJob, ComposeMontageJob, IngestTrackJob, QueueJob};
use rescore_storage::{Bucket, ObjectStore};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Context for job processing.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub storage: ObjectStore,
    pub videos: VideoRepository,
    pub tracks: TrackRepository,
    pub motions: MotionRepository,
    pub montages: MontageRepository,
}

impl ProcessingContext {
    pub async fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let pool = rescore_db::connect(&DbConfig::from_env()).await?;
        let storage = ObjectStore::from_env();

        tokio::fs::create_dir_all(&config.work_dir).await?;

        Ok(Self {
            config,
            storage,
            videos: VideoRepository::new(pool.clone()),
            tracks: TrackRepository::new(pool.clone()),
            motions: MotionRepository::new(pool.clone()),
            montages: MontageRepository::new(pool),
        })
    }
}

/// Dispatch a claimed queue message.
pub async fn process(ctx: &ProcessingContext, job: &QueueJob) -> WorkerResult<()> {
    match job {
        QueueJob::AcquireVideo(j) => acquire_video(ctx, j).await,
        QueueJob::IngestTrack(j) => ingest_track(ctx, j).await,
        QueueJob::ComposeMontage(j) => compose_montage_job(ctx, j).await,
    }
}

/// Acquire a remote source video into local custody.
pub async fn acquire_video(ctx: &ProcessingContext, job: &AcquireVideoJob) -> WorkerResult<()> {
    let Some(video) = ctx.videos.claim(job.video_id).await? else {
        debug!(video_id = %job.video_id, "Acquisition not claimable, skipping");
        return Ok(());
    };

    info!(video_id = %video.id, url = %video.origin_url, "Acquiring source video");

    let scratch = ctx.config.work_dir.join(format!("acquire_{}", video.id));
    tokio::fs::create_dir_all(&scratch).await?;

    let outcome = acquire_inner(ctx, &video, &scratch).await;
    remove_scratch_dir(&scratch).await;

    match outcome {
        Ok((storage_key, thumbnail_key)) => {
            if ctx
                .videos
                .mark_downloaded(video.id, &storage_key, thumbnail_key.as_deref())
                .await?
                .is_none()
            {
                warn!(video_id = %video.id, "Acquisition finished but record was no longer processing");
            } else {
                info!(video_id = %video.id, storage_key, "Source video downloaded");
            }
        }
        Err(e) => {
            warn!(video_id = %video.id, error = %e, "Acquisition failed");
            ctx.videos
                .mark_failed(video.id, &truncate_error_log(&e.to_string()))
                .await?;
        }
    }

    Ok(())
}

async fn acquire_inner(
    ctx: &ProcessingContext,
    video: &SourceVideo,
    scratch: &Path,
) -> WorkerResult<(String, Option<String>)> {
    let downloaded = download_video(&video.origin_url, scratch, "source").await?;

    let storage_key = SourceVideo::object_key(video.id);
    ctx.storage
        .upload_file(Bucket::SourceVideos, &storage_key, &downloaded, "video/mp4")
        .await?;

    // Thumbnail is best-effort: a missing preview never fails the job.
    let thumbnail_key = match derive_thumbnail(
        ctx,
        &downloaded,
        scratch,
        Bucket::SourceVideos,
        SourceVideo::thumbnail_object_key(video.id),
    )
    .await
    {
        Ok(key) => Some(key),
        Err(e) => {
            warn!(video_id = %video.id, error = %e, "Thumbnail extraction failed, continuing without");
            None
        }
    };

    Ok((storage_key, thumbnail_key))
}

/// Validate an uploaded audio track and probe its duration.
pub async fn ingest_track(ctx: &ProcessingContext, job: &IngestTrackJob) -> WorkerResult<()> {
    let Some(track) = ctx.tracks.get(job.track_id).await? else {
        warn!(track_id = %job.track_id, "Ingest for unknown track, skipping");
        return Ok(());
    };
    if track.status != TrackStatus::Processing {
        debug!(track_id = %track.id, status = %track.status, "Track already settled, skipping");
        return Ok(());
    }

    let local = ctx.config.work_dir.join(format!(
        "ingest_{}.{}",
        track.id,
        extension_of(&track.storage_key)
    ));

    let outcome = ingest_inner(ctx, &track, &local).await;
    remove_scratch_file(&local).await;

    match outcome {
        Ok(duration_seconds) => {
            ctx.tracks.mark_active(track.id, duration_seconds).await?;
            info!(track_id = %track.id, duration_seconds, "Audio track activated");
        }
        Err(e) => {
            warn!(track_id = %track.id, error = %e, "Audio ingest failed, deactivating track");
            ctx.tracks.mark_inactive(track.id).await?;
        }
    }

    Ok(())
}

async fn ingest_inner(
    ctx: &ProcessingContext,
    track: &AudioTrack,
    local: &Path,
) -> WorkerResult<i32> {
    ctx.storage
        .download_to_file(Bucket::Audio, &track.storage_key, local)
        .await?;

    let duration = probe_duration(local).await?;
    Ok(duration.round() as i32)
}

/// Composite a montage from a ready video artifact and a ready audio track.
pub async fn compose_montage_job(
    ctx: &ProcessingContext,
    job: &ComposeMontageJob,
) -> WorkerResult<()> {
    let Some(montage) = ctx.montages.claim(job.montage_id).await? else {
        debug!(montage_id = %job.montage_id, "Montage not claimable, skipping");
        return Ok(());
    };

    info!(montage_id = %montage.id, source = montage.source.kind(), "Compositing montage");

    let scratch = ctx.config.work_dir.join(format!("montage_{}", montage.id));
    tokio::fs::create_dir_all(&scratch).await?;

    let outcome = compose_inner(ctx, &montage, &scratch).await;
    remove_scratch_dir(&scratch).await;

    match outcome {
        Ok(result_key) => {
            if ctx
                .montages
                .mark_completed(montage.id, &result_key)
                .await?
                .is_none()
            {
                warn!(montage_id = %montage.id, "Montage finished but record was no longer processing");
            } else {
                info!(montage_id = %montage.id, result_key, "Montage completed");
            }
        }
        Err(e) => {
            // No degraded fallback: a failed mux is reported as failed.
            warn!(montage_id = %montage.id, error = %e, "Montage failed");
            ctx.montages
                .mark_failed(montage.id, &truncate_error_log(&e.to_string()))
                .await?;
        }
    }

    Ok(())
}

async fn compose_inner(
    ctx: &ProcessingContext,
    montage: &MontageJob,
    scratch: &Path,
) -> WorkerResult<String> {
    // Readiness was checked at creation; re-verify here since the artifact
    // could have been deleted or raced between enqueue and run.
    let (source_bucket, source_key) = resolve_source(ctx, &montage.source).await?;

    let track = ctx
        .tracks
        .get(montage.track_id)
        .await?
        .ok_or_else(|| WorkerError::job_failed("audio track no longer exists"))?;
    if track.status != TrackStatus::Active {
        return Err(WorkerError::job_failed(format!(
            "audio track is {}, not active",
            track.status
        )));
    }

    let video_local = scratch.join("source.mp4");
    let audio_local = scratch.join(format!("audio.{}", extension_of(&track.storage_key)));
    let output_local = scratch.join("montage.mp4");

    ctx.storage
        .download_to_file(source_bucket, &source_key, &video_local)
        .await?;
    ctx.storage
        .download_to_file(Bucket::Audio, &track.storage_key, &audio_local)
        .await?;

    compose_montage(&video_local, &audio_local, &output_local).await?;

    let result_key = MontageJob::object_key(montage.id);
    ctx.storage
        .upload_file(Bucket::Montages, &result_key, &output_local, "video/mp4")
        .await?;

    Ok(result_key)
}

/// Resolve the montage's single video source to a bucket and key, verifying
/// the artifact is still in a ready state.
async fn resolve_source(
    ctx: &ProcessingContext,
    source: &MontageSource,
) -> WorkerResult<(Bucket, String)> {
    match source {
        MontageSource::Video { video_id } => {
            let video = ctx
                .videos
                .get(*video_id)
                .await?
                .ok_or_else(|| WorkerError::job_failed("source video no longer exists"))?;
            if !video.status.is_ready() {
                return Err(WorkerError::job_failed(format!(
                    "source video is {}, not downloaded",
                    video.status
                )));
            }
            let key = video
                .storage_key
                .ok_or_else(|| WorkerError::job_failed("source video has no stored artifact"))?;
            Ok((Bucket::SourceVideos, key))
        }
        MontageSource::Motion { motion_id } => {
            let motion: MotionJob = ctx
                .motions
                .get(*motion_id)
                .await?
                .ok_or_else(|| WorkerError::job_failed("motion job no longer exists"))?;
            if !motion.status.is_ready() {
                return Err(WorkerError::job_failed(format!(
                    "motion job is {}, not success",
                    motion.status
                )));
            }
            let key = motion
                .result_video_key
                .ok_or_else(|| WorkerError::job_failed("motion job has no stored artifact"))?;
            Ok((Bucket::MotionVideos, key))
        }
    }
}

/// Extract a best-effort thumbnail and upload it next to the video.
async fn derive_thumbnail(
    ctx: &ProcessingContext,
    video: &Path,
    scratch: &Path,
    bucket: Bucket,
    key: String,
) -> WorkerResult<String> {
    let local = scratch.join("thumbnail.jpg");
    extract_thumbnail(video, &local).await?;
    ctx.storage
        .upload_file(bucket, &key, &local, "image/jpeg")
        .await?;
    Ok(key)
}

fn extension_of(key: &str) -> &str {
    Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
}

async fn remove_scratch_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), error = %e, "Failed to remove scratch dir");
        }
    }
}

async fn remove_scratch_file(file: &Path) {
    if let Err(e) = tokio::fs::remove_file(file).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(file = %file.display(), error = %e, "Failed to remove scratch file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of_storage_keys() {
        assert_eq!(extension_of("audio_abc.mp3"), "mp3");
        assert_eq!(extension_of("video_abc.mp4"), "mp4");
        assert_eq!(extension_of("no-extension"), "bin");
    }
}
