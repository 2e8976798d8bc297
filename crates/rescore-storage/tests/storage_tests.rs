//! Object store integration tests.
//!
//! These tests require an S3-compatible endpoint (MinIO); configure via
//! `STORAGE_*` env vars and run with `cargo test -p rescore-storage -- --ignored`.

use std::io::Write;
use std::time::Duration;

use rescore_storage::{Bucket, ObjectStore};

#[tokio::test]
#[ignore = "requires object storage"]
async fn test_connectivity() {
    dotenvy::dotenv().ok();

    let store = ObjectStore::from_env();
    store.ensure_buckets().await.expect("Failed to ensure buckets");
    store
        .check_connectivity()
        .await
        .expect("Failed connectivity check");
}

#[tokio::test]
#[ignore = "requires object storage"]
async fn test_upload_download_delete_cycle() {
    dotenvy::dotenv().ok();

    let store = ObjectStore::from_env();
    store.ensure_buckets().await.expect("Failed to ensure buckets");

    let mut temp_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(b"integration test payload")
        .expect("Failed to write temp file");

    let key = format!("test/integration_{}.bin", uuid());
    store
        .upload_file(
            Bucket::SourceVideos,
            &key,
            temp_file.path(),
            "application/octet-stream",
        )
        .await
        .expect("Failed to upload");

    let dest = tempfile::NamedTempFile::new().expect("Failed to create dest file");
    store
        .download_to_file(Bucket::SourceVideos, &key, dest.path())
        .await
        .expect("Failed to download");
    let bytes = std::fs::read(dest.path()).expect("Failed to read downloaded file");
    assert_eq!(bytes, b"integration test payload");

    store
        .delete(Bucket::SourceVideos, &key)
        .await
        .expect("Failed to delete");

    let err = store
        .download_to_file(Bucket::SourceVideos, &key, dest.path())
        .await
        .expect_err("Deleted object must not download");
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires object storage"]
async fn test_presigned_url_resolves() {
    dotenvy::dotenv().ok();

    let store = ObjectStore::from_env();
    let url = store
        .presign_get(
            Bucket::Montages,
            "test/presign.mp4",
            Duration::from_secs(3600),
        )
        .await
        .expect("Failed to presign");
    assert!(url.contains("X-Amz-Signature"));
}

fn uuid() -> String {
    format!("{:x}", std::process::id())
}
