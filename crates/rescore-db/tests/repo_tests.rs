//! Repository integration tests.
//!
//! These tests require a Postgres database; set `DATABASE_URL` and run with
//! `cargo test -p rescore-db -- --ignored`.

use rescore_db::{connect, migrate, DbConfig};
use rescore_db::{MontageRepository, MotionRepository, TrackRepository, VideoRepository};
use rescore_models::{MontageSource, MotionStatus, VideoStatus};
use uuid::Uuid;

async fn test_pool() -> sqlx::PgPool {
    dotenvy::dotenv().ok();
    let pool = connect(&DbConfig::from_env())
        .await
        .expect("Failed to connect to Postgres");
    migrate(&pool).await.expect("Failed to run migrations");
    pool
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_acquisition_dedup_returns_existing_record() {
    let pool = test_pool().await;
    let repo = VideoRepository::new(pool);

    let url = format!("https://example.com/v/{}", Uuid::new_v4());
    let created = repo.create(&url).await.expect("create");
    assert_eq!(created.status, VideoStatus::Pending);

    let found = repo
        .find_by_origin_url(&url)
        .await
        .expect("lookup")
        .expect("record exists");
    assert_eq!(found.id, created.id);
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_claim_is_exactly_once() {
    let pool = test_pool().await;
    let repo = VideoRepository::new(pool);

    let url = format!("https://example.com/v/{}", Uuid::new_v4());
    let created = repo.create(&url).await.expect("create");

    let first = repo.claim(created.id).await.expect("claim");
    assert!(first.is_some(), "first claim wins");
    assert_eq!(first.unwrap().status, VideoStatus::Processing);

    let second = repo.claim(created.id).await.expect("claim");
    assert!(second.is_none(), "second claim must be a no-op");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_terminal_status_is_monotonic() {
    let pool = test_pool().await;
    let repo = VideoRepository::new(pool);

    let url = format!("https://example.com/v/{}", Uuid::new_v4());
    let created = repo.create(&url).await.expect("create");
    repo.claim(created.id).await.expect("claim");

    let done = repo
        .mark_downloaded(created.id, "video_test.mp4", None)
        .await
        .expect("mark downloaded");
    assert!(done.is_some());

    // A late failure report must not overwrite the terminal state.
    let late = repo.mark_failed(created.id, "boom").await.expect("late write");
    assert!(late.is_none());

    let current = repo.get(created.id).await.expect("get").expect("row");
    assert_eq!(current.status, VideoStatus::Downloaded);
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_callback_redelivery_writes_once() {
    let pool = test_pool().await;
    let repo = MotionRepository::new(pool);

    let external_id = format!("ext-{}", Uuid::new_v4());
    let job = repo
        .create_processing(Uuid::new_v4(), Uuid::new_v4(), &external_id)
        .await
        .expect("create");
    assert_eq!(job.status, MotionStatus::Processing);

    let first = repo
        .complete_success(&external_id, "motion_a.mp4", None)
        .await
        .expect("first completion");
    assert!(first.is_some());

    // Redelivered callback: zero rows, original result untouched.
    let second = repo
        .complete_success(&external_id, "motion_b.mp4", None)
        .await
        .expect("second completion");
    assert!(second.is_none());

    let current = repo.get(job.id).await.expect("get").expect("row");
    assert_eq!(current.result_video_key.as_deref(), Some("motion_a.mp4"));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_motion_cache_hits_only_success() {
    let pool = test_pool().await;
    let repo = MotionRepository::new(pool);

    let avatar_id = Uuid::new_v4();
    let reference_id = Uuid::new_v4();
    let external_id = format!("ext-{}", Uuid::new_v4());

    repo.create_processing(avatar_id, reference_id, &external_id)
        .await
        .expect("create");
    assert!(repo
        .find_cached(avatar_id, reference_id)
        .await
        .expect("lookup")
        .is_none());

    repo.complete_success(&external_id, "motion_c.mp4", None)
        .await
        .expect("complete");
    let cached = repo
        .find_cached(avatar_id, reference_id)
        .await
        .expect("lookup")
        .expect("cache hit");
    assert_eq!(cached.external_job_id.as_deref(), Some(&*external_id));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_montage_row_round_trips_source_branch() {
    let pool = test_pool().await;
    let videos = VideoRepository::new(pool.clone());
    let tracks = TrackRepository::new(pool.clone());
    let montages = MontageRepository::new(pool);

    let url = format!("https://example.com/v/{}", Uuid::new_v4());
    let video = videos.create(&url).await.expect("video");
    let track = tracks
        .create(&rescore_db::NewTrack {
            id: Uuid::new_v4(),
            name: format!("track-{}", Uuid::new_v4()),
            artist: None,
            storage_key: "audio_test.mp3".to_string(),
            mime_type: "audio/mpeg".to_string(),
            size_bytes: 1024,
        })
        .await
        .expect("track");

    let source = MontageSource::Video { video_id: video.id };
    let job = montages.create(&source, track.id).await.expect("montage");
    let fetched = montages.get(job.id).await.expect("get").expect("row");
    assert_eq!(fetched.source, source);
}
