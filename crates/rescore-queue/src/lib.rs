//! Redis Streams job queue.
//!
//! This crate provides:
//! - Typed job payloads for the three worker-driven job kinds
//! - Consumer-group delivery (each message claimed by one consumer)
//! - Dedup keys on enqueue and a dead-letter stream
//!
//! Delivery is at-least-once; the database claim write is what makes job
//! execution effectively once.

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{AcquireVideoJob, ComposeMontageJob, IngestTrackJob, QueueJob};
pub use queue::{Delivery, JobQueue, QueueConfig};
