//! Replay layer error types.

use replay_domain::{ReplicationTaskType, SourceTaskId};
use replay_store::QueueError;
use thiserror::Error;

/// Errors reported by a task executor.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Executor refused to apply the payload
    #[error("Task rejected: {0}")]
    Rejected(String),

    /// Executor has no handler for this payload kind
    #[error("Unsupported task type: {0}")]
    Unsupported(ReplicationTaskType),

    /// Caller cancelled the execution
    #[error("Execution cancelled")]
    Cancelled,
}

/// Errors surfaced by DLQ read, purge and merge.
#[derive(Debug, Error)]
pub enum DlqError {
    /// A queue call failed where the failure is fatal
    #[error("Queue unavailable: {0}")]
    QueueUnavailable(#[source] QueueError),

    /// A replayed task failed; replay of the page stopped there
    #[error("Replication task {source_task_id} failed: {source}")]
    ExecutionFailure {
        /// ID of the failing task
        source_task_id: SourceTaskId,
        /// Executor error
        #[source]
        source: ExecError,
    },

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Request arguments were rejected before touching the queue
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<QueueError> for DlqError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Cancelled => DlqError::Cancelled,
            other => DlqError::QueueUnavailable(other),
        }
    }
}

/// Result type for DLQ operations.
pub type DlqResult<T> = Result<T, DlqError>;
