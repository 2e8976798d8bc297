//! Application state.

use std::sync::Arc;

use rescore_db::{
    AvatarRepository, DbConfig, MontageRepository, MotionRepository, TrackRepository,
    VideoRepository,
};
use rescore_motion::MotionClient;
use rescore_queue::JobQueue;
use rescore_storage::ObjectStore;

use crate::config::ApiConfig;
use crate::rate_limit::{upload_limiter, UploadRateLimiter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<ObjectStore>,
    pub queue: Arc<JobQueue>,
    pub motion_client: Arc<MotionClient>,
    pub http: reqwest::Client,
    pub videos: VideoRepository,
    pub tracks: TrackRepository,
    pub motions: MotionRepository,
    pub montages: MontageRepository,
    pub avatars: AvatarRepository,
    pub upload_limiter: Arc<UploadRateLimiter>,
}

impl AppState {
    /// Create new application state: connect the database, run migrations
    /// and build the service clients.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = rescore_db::connect(&DbConfig::from_env()).await?;
        rescore_db::migrate(&pool).await?;

        let storage = ObjectStore::from_env();
        let queue = JobQueue::from_env()?;
        let motion_client = MotionClient::from_env()?;
        let http = reqwest::Client::builder()
            .timeout(config.rehost_timeout)
            .build()?;

        tokio::fs::create_dir_all(&config.scratch_dir).await?;

        let upload_limiter = Arc::new(upload_limiter(config.uploads_per_minute));

        Ok(Self {
            config,
            storage: Arc::new(storage),
            queue: Arc::new(queue),
            motion_client: Arc::new(motion_client),
            http,
            videos: VideoRepository::new(pool.clone()),
            tracks: TrackRepository::new(pool.clone()),
            motions: MotionRepository::new(pool.clone()),
            montages: MontageRepository::new(pool.clone()),
            avatars: AvatarRepository::new(pool),
            upload_limiter,
        })
    }
}
