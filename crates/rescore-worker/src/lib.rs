//! Media processing worker.
//!
//! This crate provides:
//! - The queue consumer loop with bounded concurrency and graceful shutdown
//! - The acquisition, audio-ingest and compositing processors
//! - A per-job fault boundary: any processor error becomes a terminal
//!   `failed` status write, never an abandoned `processing` record

pub mod config;
pub mod error;
pub mod executor;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use processor::ProcessingContext;
