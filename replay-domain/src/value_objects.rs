//! Value Objects for the replication DLQ
//!
//! Identifiers, pagination tokens and the domain error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::entities::ReplicationTask;

// =============================================================================
// Domain Errors
// =============================================================================

/// Errors raised while constructing or validating domain values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Declared task type does not match the attached attributes
    #[error("Task type mismatch: declared {declared}, attributes carry {actual}")]
    TaskTypeMismatch {
        /// Type carried in the envelope
        declared: String,
        /// Type implied by the attributes
        actual: String,
    },

    /// Source task IDs are non-negative
    #[error("Invalid source task id: {0}")]
    InvalidSourceTaskId(i64),
}

// =============================================================================
// Identifiers
// =============================================================================

/// Source-cluster identifier of a replication task, strictly increasing per queue
pub type SourceTaskId = i64;

/// Exclusive lower bound of the tasks not yet retired from a DLQ
pub type AckLevel = i64;

// =============================================================================
// Page Token
// =============================================================================

/// Opaque continuation cursor issued by a queue.
///
/// Only the queue that issued a token interprets its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageToken(Vec<u8>);

impl PageToken {
    /// Wrap raw token bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the raw token bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True when the token carries no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// =============================================================================
// Page
// =============================================================================

/// A bounded, ordered slice of quarantined tasks.
///
/// `tasks` are ascending by source task ID. `next_page_token` is present
/// only when the queue holds more tasks in the requested range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Tasks in ascending source task ID order
    pub tasks: Vec<ReplicationTask>,
    /// Cursor for the next page, if any
    pub next_page_token: Option<PageToken>,
}

impl Page {
    /// Create a page
    pub fn new(tasks: Vec<ReplicationTask>, next_page_token: Option<PageToken>) -> Self {
        Self {
            tasks,
            next_page_token,
        }
    }

    /// An empty, final page
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of tasks on the page
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when the page holds no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Source task ID of the last task on the page
    pub fn last_source_task_id(&self) -> Option<SourceTaskId> {
        self.tasks.last().map(|t| t.source_task_id)
    }
}

// =============================================================================
// Tests
// =============================================================================
