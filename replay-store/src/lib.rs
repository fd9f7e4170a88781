//! Replication DLQ Storage Layer
//!
//! Provides the queue port the replay core consumes.
//!
//! # Architecture
//!
//! - **Queue trait**: Defines the storage interface (port)
//! - **In-memory queue**: Reference implementation for tests and development
//!
//! # Usage
//!
//! ```rust
//! use replay_domain::{ReplicationTask, TaskAttributes};
//! use replay_store::{MemoryQueue, ReplicationQueue};
//! use tokio_util::sync::CancellationToken;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue = MemoryQueue::with_ack_level(10);
//!     let cancel = CancellationToken::new();
//!
//!     let task = ReplicationTask::new(
//!         11,
//!         TaskAttributes::FailoverMarker { domain_id: Uuid::now_v7(), failover_version: 2 },
//!     );
//!     queue.publish_to_dlq(task, &cancel).await.unwrap();
//!
//!     let ack_level = queue.get_dlq_ack_level(&cancel).await.unwrap();
//!     let page = queue.get_messages_from_dlq(ack_level, 20, 100, None, &cancel).await.unwrap();
//!     println!("Quarantined tasks: {}", page.len());
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
mod repository;

// Re-exports
pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;
pub use repository::ReplicationQueue;
