//! Replication DLQ Domain Layer
//!
//! Pure types with zero I/O dependencies: quarantined replication tasks,
//! their typed payloads, pages and continuation tokens.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    DomainOperation, DomainTaskAttributes, ReplicationTask, ReplicationTaskType, TaskAttributes,
};
pub use value_objects::{AckLevel, DomainError, Page, PageToken, SourceTaskId};
