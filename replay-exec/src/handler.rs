//! DLQ message handler: read, purge and merge quarantined tasks.
//!
//! Every operation reads the queue's ack level first and then acts on the
//! half-open range `(ack_level, last_message_id]`.
//!
//! # Merge
//!
//! ```text
//! ack level → fetch page → replay t1..tn-1 (checkpoint each) → replay tn
//!           → range delete (ack, tn] → ack level = tn
//! ```
//!
//! A failing task stops the page. The tasks replayed before it are removed
//! one by one and the failure is returned; nothing after it is executed.
//! Checkpoint writes inside the page and the final ack update are
//! best-effort: losing one only means a later merge may replay a task
//! again, never that a task is skipped.
//!
//! The handler does not serialize concurrent calls against the same queue.
//! Callers must not run `merge` or `purge` concurrently on one queue.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use replay_domain::{Page, PageToken, ReplicationTask, SourceTaskId};
use replay_store::ReplicationQueue;

use crate::error::{DlqError, DlqResult, ExecError};
use crate::ports::TaskExecutor;

// =============================================================================
// DLQ Message Handler
// =============================================================================

/// Inspects, replays and discards the tasks of one replication DLQ.
pub struct DlqMessageHandler<Q: ReplicationQueue, X: TaskExecutor> {
    /// Queue holding the quarantined tasks
    queue: Arc<Q>,
    /// Executor applying replayed tasks
    executor: Arc<X>,
}

impl<Q: ReplicationQueue, X: TaskExecutor> DlqMessageHandler<Q, X> {
    /// Create a new handler.
    pub fn new(queue: Arc<Q>, executor: Arc<X>) -> Self {
        Self { queue, executor }
    }

    /// Fetch one page of quarantined tasks without modifying the queue.
    pub async fn read(
        &self,
        last_message_id: SourceTaskId,
        page_size: usize,
        page_token: Option<&PageToken>,
        cancel: &CancellationToken,
    ) -> DlqResult<Page> {
        validate_page_size(page_size)?;

        let ack_level = self.queue.get_dlq_ack_level(cancel).await?;
        let page = self
            .queue
            .get_messages_from_dlq(ack_level, last_message_id, page_size, page_token, cancel)
            .await?;

        debug!(
            ack_level,
            last_message_id,
            returned = page.len(),
            has_more = page.next_page_token.is_some(),
            "Read DLQ page"
        );

        Ok(page)
    }

    /// Discard every task in `(ack_level, last_message_id]` without replay.
    ///
    /// The ack level only advances once the range delete succeeded.
    /// Purging an already purged bound again is a no-op.
    pub async fn purge(
        &self,
        last_message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> DlqResult<()> {
        let ack_level = self.queue.get_dlq_ack_level(cancel).await?;

        // The ack level never moves backwards.
        if last_message_id < ack_level {
            info!(ack_level, last_message_id, "DLQ already purged past bound");
            return Ok(());
        }

        self.queue
            .range_delete_messages_from_dlq(ack_level, last_message_id, cancel)
            .await?;
        self.queue.update_dlq_ack_level(last_message_id, cancel).await?;

        info!(
            previous_ack_level = ack_level,
            ack_level = last_message_id,
            "Purged DLQ tasks"
        );
        Ok(())
    }

    /// Replay one page of quarantined tasks in ascending order.
    ///
    /// On success the page's range is deleted, the ack level advances to
    /// the last replayed task and no continuation is returned: the range
    /// has moved, so callers issue a fresh merge for any remaining backlog.
    ///
    /// Merge always starts right after the ack level, so a non-empty
    /// `page_token` is rejected with `InvalidRequest` before any queue call.
    pub async fn merge(
        &self,
        last_message_id: SourceTaskId,
        page_size: usize,
        page_token: Option<&PageToken>,
        cancel: &CancellationToken,
    ) -> DlqResult<Option<PageToken>> {
        validate_page_size(page_size)?;
        if page_token.is_some_and(|token| !token.is_empty()) {
            return Err(DlqError::InvalidRequest(
                "merge starts at the ack level and does not accept a page token".to_string(),
            ));
        }

        let ack_level = self.queue.get_dlq_ack_level(cancel).await?;
        let page = self
            .queue
            .get_messages_from_dlq(ack_level, last_message_id, page_size, None, cancel)
            .await?;

        let Some((last, head)) = page.tasks.split_last() else {
            debug!(ack_level, last_message_id, "No DLQ tasks to merge");
            return Ok(None);
        };

        let mut replayed: Vec<SourceTaskId> = Vec::with_capacity(head.len());
        for task in head {
            self.replay(task, &replayed, cancel).await?;
            replayed.push(task.source_task_id);
            self.checkpoint(task.source_task_id, cancel).await;
        }

        // The last task is checkpointed by the range delete + ack update below.
        self.replay(last, &replayed, cancel).await?;

        let last_task_id = last.source_task_id;
        self.queue
            .range_delete_messages_from_dlq(ack_level, last_task_id, cancel)
            .await?;

        if let Err(e) = self.queue.update_dlq_ack_level(last_task_id, cancel).await {
            warn!(
                ack_level = last_task_id,
                error = %e,
                "Failed to update DLQ ack level after merge (tasks already deleted)"
            );
        }

        info!(
            previous_ack_level = ack_level,
            ack_level = last_task_id,
            merged = page.len(),
            "Merged DLQ page"
        );
        Ok(None)
    }

    /// Execute one task, cleaning up the replayed prefix if it fails.
    async fn replay(
        &self,
        task: &ReplicationTask,
        replayed: &[SourceTaskId],
        cancel: &CancellationToken,
    ) -> DlqResult<()> {
        if cancel.is_cancelled() {
            warn!(
                source_task_id = task.source_task_id,
                replayed = replayed.len(),
                "DLQ merge cancelled"
            );
            return Err(DlqError::Cancelled);
        }

        match self.executor.execute(&task.attributes, cancel).await {
            Ok(()) => {
                debug!(
                    source_task_id = task.source_task_id,
                    task_type = %task.task_type,
                    "Replayed DLQ task"
                );
                Ok(())
            }
            Err(ExecError::Cancelled) => Err(DlqError::Cancelled),
            Err(e) => {
                error!(
                    source_task_id = task.source_task_id,
                    task_type = %task.task_type,
                    error = %e,
                    "Failed to replay DLQ task"
                );
                self.remove_replayed(replayed, cancel).await;
                Err(DlqError::ExecutionFailure {
                    source_task_id: task.source_task_id,
                    source: e,
                })
            }
        }
    }

    /// Persist progress after a replayed task. Failure is non-fatal.
    async fn checkpoint(&self, source_task_id: SourceTaskId, cancel: &CancellationToken) {
        if let Err(e) = self.queue.update_dlq_ack_level(source_task_id, cancel).await {
            warn!(
                ack_level = source_task_id,
                error = %e,
                "Failed to checkpoint DLQ ack level"
            );
        }
    }

    /// Delete already replayed tasks individually. Failures are logged only.
    async fn remove_replayed(&self, replayed: &[SourceTaskId], cancel: &CancellationToken) {
        for &source_task_id in replayed {
            if let Err(e) = self.queue.delete_message_from_dlq(source_task_id, cancel).await {
                warn!(source_task_id, error = %e, "Failed to remove replayed DLQ task");
            }
        }
    }
}

fn validate_page_size(page_size: usize) -> DlqResult<()> {
    if page_size == 0 {
        return Err(DlqError::InvalidRequest(
            "page size must be positive".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
