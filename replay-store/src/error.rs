//! Queue layer errors

use replay_domain::SourceTaskId;
use thiserror::Error;

/// Errors that can occur in a replication queue
#[derive(Debug, Error)]
pub enum QueueError {
    /// Backing store could not serve the call
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    /// Published task does not extend the queue's ID sequence
    #[error("Out of order publish: task {source_task_id} must exceed {last_published}")]
    OutOfOrder {
        /// ID of the rejected task
        source_task_id: SourceTaskId,
        /// Highest ID already published
        last_published: SourceTaskId,
    },

    /// Page token was not issued by this queue
    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

impl QueueError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// True if the error reports caller cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueueError::Cancelled)
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
