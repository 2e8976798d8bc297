//! S3-compatible artifact store client.
//!
//! This crate provides:
//! - One bucket per artifact kind (audio, source videos, motion videos,
//!   rendered montages, avatars)
//! - File upload/download by path
//! - Presigned GET URL generation (the `resolve_url` of the store contract)
//! - Bucket bootstrap and deletion
//!
//! The store holds bytes only; job status lives exclusively in the database.

pub mod client;
pub mod error;

pub use client::{Bucket, ObjectStore, StorageConfig};
pub use error::{StorageError, StorageResult};
