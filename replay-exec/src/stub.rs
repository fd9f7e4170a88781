//! Stub executor for testing.
//!
//! Simulates applying replication tasks without touching cluster state.

use async_trait::async_trait;
use replay_domain::{ReplicationTaskType, TaskAttributes};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::ExecError;
use crate::ports::TaskExecutor;

// =============================================================================
// Stub Executor
// =============================================================================

/// Stub executor for testing.
///
/// Applies every payload immediately unless it was registered with
/// [`StubExecutor::reject`] or its type with [`StubExecutor::unsupport`].
pub struct StubExecutor {
    /// Payloads applied so far, in order
    applied: RwLock<Vec<TaskAttributes>>,
    /// Payloads that fail on execution
    rejected: RwLock<Vec<TaskAttributes>>,
    /// Task types with no handler
    unsupported: RwLock<Vec<ReplicationTaskType>>,
}

impl StubExecutor {
    /// Create a stub that accepts everything.
    pub fn new() -> Self {
        Self {
            applied: RwLock::new(Vec::new()),
            rejected: RwLock::new(Vec::new()),
            unsupported: RwLock::new(Vec::new()),
        }
    }

    /// Configure a payload to fail every time it is executed.
    pub async fn reject(&self, attributes: TaskAttributes) {
        self.rejected.write().await.push(attributes);
    }

    /// Report every payload of `task_type` as unsupported.
    pub async fn unsupport(&self, task_type: ReplicationTaskType) {
        self.unsupported.write().await.push(task_type);
    }

    /// Payloads applied so far, in execution order.
    pub async fn applied(&self) -> Vec<TaskAttributes> {
        self.applied.read().await.clone()
    }

    /// Number of successful executions.
    pub async fn applied_count(&self) -> usize {
        self.applied.read().await.len()
    }
}

impl Default for StubExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskExecutor for StubExecutor {
    async fn execute(
        &self,
        attributes: &TaskAttributes,
        cancel: &CancellationToken,
    ) -> Result<(), ExecError> {
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        let task_type = attributes.task_type();
        if self.unsupported.read().await.contains(&task_type) {
            return Err(ExecError::Unsupported(task_type));
        }

        if self.rejected.read().await.contains(attributes) {
            return Err(ExecError::Rejected(format!(
                "Simulated {} task failure",
                task_type
            )));
        }

        tracing::debug!(%task_type, "Stub: task applied");
        self.applied.write().await.push(attributes.clone());
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
