//! Test helpers for replication DLQ tests.
//!
//! Provides task fixtures, queue seeding, and a recording queue that logs
//! every call and injects failures on demand.

mod helpers;
mod recording;

pub use helpers::{domain_task, seed_queue, seed_recording_queue};
pub use recording::{QueueCall, RecordingQueue};

/// Result type for test helpers.
pub type Result<T> = anyhow::Result<T>;
