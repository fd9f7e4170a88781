//! Replication DLQ Replay Layer
//!
//! Ordered replay and purge of quarantined replication tasks.
//!
//! # Architecture
//!
//! ```text
//! Operator → DlqMessageHandler → ReplicationQueue (ack level, pages, deletes)
//!                              → TaskExecutor (apply one task)
//! ```
//!
//! # Components
//!
//! - **Ports**: Trait for the executor that applies replayed tasks
//! - **Handler**: Read, purge and merge over `(ack_level, last_message_id]`
//! - **Stub**: Test executor for development
//!
//! # Example
//!
//! ```rust,ignore
//! use replay_exec::{DlqMessageHandler, StubExecutor};
//! use replay_store::MemoryQueue;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let queue = Arc::new(MemoryQueue::with_ack_level(10));
//! let executor = Arc::new(StubExecutor::new());
//! let handler = DlqMessageHandler::new(queue, executor);
//!
//! // Replay everything up to task 20, one page at a time
//! handler.merge(20, 100, None, &CancellationToken::new()).await?;
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod handler;
pub mod ports;
pub mod stub;

// Re-exports for convenience
pub use error::{DlqError, DlqResult, ExecError};
pub use handler::DlqMessageHandler;
pub use ports::TaskExecutor;
pub use stub::StubExecutor;
