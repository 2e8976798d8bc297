//! Object store client.

use std::path::Path;
use std::time::Duration;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Artifact kinds, each stored in its own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Audio,
    SourceVideos,
    MotionVideos,
    Montages,
    Avatars,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible providers (MinIO, R2). `None`
    /// targets AWS proper.
    pub endpoint_url: Option<String>,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_audio: String,
    pub bucket_source_videos: String,
    pub bucket_motion_videos: String,
    pub bucket_montages: String,
    pub bucket_avatars: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint_url: Some("http://localhost:9000".to_string()),
            region: "us-east-1".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket_audio: "audio-tracks".to_string(),
            bucket_source_videos: "source-videos".to_string(),
            bucket_motion_videos: "motion-videos".to_string(),
            bucket_montages: "rendered-montages".to_string(),
            bucket_avatars: "avatars".to_string(),
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT").ok().or(defaults.endpoint_url),
            region: std::env::var("STORAGE_REGION").unwrap_or(defaults.region),
            access_key: std::env::var("STORAGE_ACCESS_KEY").unwrap_or(defaults.access_key),
            secret_key: std::env::var("STORAGE_SECRET_KEY").unwrap_or(defaults.secret_key),
            bucket_audio: std::env::var("STORAGE_BUCKET_AUDIO").unwrap_or(defaults.bucket_audio),
            bucket_source_videos: std::env::var("STORAGE_BUCKET_SOURCES")
                .unwrap_or(defaults.bucket_source_videos),
            bucket_motion_videos: std::env::var("STORAGE_BUCKET_MOTIONS")
                .unwrap_or(defaults.bucket_motion_videos),
            bucket_montages: std::env::var("STORAGE_BUCKET_MONTAGES")
                .unwrap_or(defaults.bucket_montages),
            bucket_avatars: std::env::var("STORAGE_BUCKET_AVATARS")
                .unwrap_or(defaults.bucket_avatars),
        }
    }
}

/// Client for the artifact store.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    config: StorageConfig,
}

impl ObjectStore {
    /// Create a new client.
    pub fn new(config: StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "rescore-static",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        // Path-style addressing is required by MinIO and friends.
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Self { client, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(StorageConfig::from_env())
    }

    pub fn bucket_name(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::Audio => &self.config.bucket_audio,
            Bucket::SourceVideos => &self.config.bucket_source_videos,
            Bucket::MotionVideos => &self.config.bucket_motion_videos,
            Bucket::Montages => &self.config.bucket_montages,
            Bucket::Avatars => &self.config.bucket_avatars,
        }
    }

    /// Create all buckets that do not exist yet.
    pub async fn ensure_buckets(&self) -> StorageResult<()> {
        for bucket in [
            Bucket::Audio,
            Bucket::SourceVideos,
            Bucket::MotionVideos,
            Bucket::Montages,
            Bucket::Avatars,
        ] {
            let name = self.bucket_name(bucket).to_string();
            if let Err(e) = self.client.create_bucket().bucket(&name).send().await {
                let service = e.into_service_error();
                if !service.is_bucket_already_owned_by_you()
                    && !service.is_bucket_already_exists()
                {
                    return Err(StorageError::BucketFailed(format!("{name}: {service}")));
                }
            } else {
                info!(bucket = %name, "Created bucket");
            }
        }
        Ok(())
    }

    /// Cheap liveness probe against the store.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket_source_videos)
            .send()
            .await
            .map_err(|e| StorageError::BucketFailed(e.into_service_error().to_string()))?;
        Ok(())
    }

    /// Upload a local file under the given key, overwriting any previous
    /// object (uploads are at-least-once with idempotent overwrite).
    pub async fn upload_file(
        &self,
        bucket: Bucket,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {e}", path.display())))?;

        self.client
            .put_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.into_service_error().to_string()))?;

        debug!(bucket = self.bucket_name(bucket), key, "Uploaded object");
        Ok(())
    }

    /// Upload an in-memory buffer under the given key.
    pub async fn upload_bytes(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.into_service_error().to_string()))?;

        debug!(bucket = self.bucket_name(bucket), key, "Uploaded object");
        Ok(())
    }

    /// Download an object to a local file.
    pub async fn download_to_file(
        &self,
        bucket: Bucket,
        key: &str,
        path: &Path,
    ) -> StorageResult<()> {
        let response = self
            .client
            .get_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::DownloadFailed(service.to_string())
                }
            })?;

        let mut file = tokio::fs::File::create(path).await?;
        let mut body = response.body;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(bucket = self.bucket_name(bucket), key, "Downloaded object");
        Ok(())
    }

    /// Delete an object. Deleting a missing object is not an error.
    pub async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.into_service_error().to_string()))?;
        Ok(())
    }

    /// Resolve a key to a retrievable URL with a bounded lifetime.
    pub async fn presign_get(
        &self,
        bucket: Bucket,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::PresignFailed(e.into_service_error().to_string()))?;

        Ok(request.uri().to_string())
    }
}
