//! Replay layer port definitions.
//!
//! The executor applies a decoded replication task to local cluster state.
//! The replay core treats it as a black box that reports success or failure.
//! The queue port lives in `replay-store`.

use async_trait::async_trait;
use replay_domain::TaskAttributes;
use tokio_util::sync::CancellationToken;

use crate::error::ExecError;

// =============================================================================
// Task Executor Port
// =============================================================================

/// Port for applying replication tasks.
///
/// Implementations:
/// - `StubExecutor` - For testing (records payloads, rejects configured ones)
///
/// A task whose execution succeeded may be executed again if the process
/// stops before its deletion is persisted, so implementations must tolerate
/// re-applying the most recent task of an interrupted page.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Apply one task payload.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the change is applied; `ExecError::Cancelled` if
    /// `cancel` fired before the change was applied.
    async fn execute(
        &self,
        attributes: &TaskAttributes,
        cancel: &CancellationToken,
    ) -> Result<(), ExecError>;
}
