//! Daemon error types.

use replay_domain::DomainError;
use replay_exec::DlqError;
use replay_store::QueueError;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// DLQ operation error
    #[error("DLQ error: {0}")]
    Dlq(#[from] DlqError),

    /// Queue error outside a DLQ operation
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API server I/O error
    #[error("API server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
