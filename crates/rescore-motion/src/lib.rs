//! Client for the external motion generation service.
//!
//! This crate provides:
//! - Synchronous job submission (`submit`) returning the external job id
//! - The callback payload types with defensive parsing
//! - Bounded retry for transient submission failures
//!
//! Completion is never polled; the service pushes a callback to the API's
//! inbound endpoint, which correlates by external job id.

pub mod callback;
pub mod client;
pub mod error;

pub use callback::{CallbackData, CallbackEnvelope};
pub use client::{MotionClient, MotionClientConfig};
pub use error::{MotionError, MotionResult};
