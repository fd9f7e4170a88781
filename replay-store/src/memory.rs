//! In-memory queue implementation
//!
//! Used for testing and development without a durable backend.
//! Thread-safe using tokio RwLock for concurrent access.

use crate::error::{QueueError, QueueResult};
use crate::repository::ReplicationQueue;
use async_trait::async_trait;
use replay_domain::{AckLevel, Page, PageToken, ReplicationTask, SourceTaskId};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// In-memory DLQ for testing
pub struct MemoryQueue {
    tasks: RwLock<BTreeMap<SourceTaskId, ReplicationTask>>,
    ack_level: RwLock<AckLevel>,
    last_published: RwLock<Option<SourceTaskId>>,
}

impl MemoryQueue {
    /// Create a new empty queue with ack level 0
    pub fn new() -> Self {
        Self::with_ack_level(0)
    }

    /// Create a new empty queue starting at the given ack level
    pub fn with_ack_level(ack_level: AckLevel) -> Self {
        Self {
            tasks: RwLock::new(BTreeMap::new()),
            ack_level: RwLock::new(ack_level),
            last_published: RwLock::new(None),
        }
    }

    /// Number of tasks physically present
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// True when no task is present
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Check whether a task is present
    pub async fn contains(&self, source_task_id: SourceTaskId) -> bool {
        self.tasks.read().await.contains_key(&source_task_id)
    }

    /// IDs of all present tasks, ascending
    pub async fn source_task_ids(&self) -> Vec<SourceTaskId> {
        self.tasks.read().await.keys().copied().collect()
    }

    /// Current ack level, bypassing cancellation
    pub async fn ack_level(&self) -> AckLevel {
        *self.ack_level.read().await
    }

    /// Clear all tasks and reset the ack level (useful for test setup)
    pub async fn clear(&self, ack_level: AckLevel) {
        self.tasks.write().await.clear();
        *self.ack_level.write().await = ack_level;
        *self.last_published.write().await = None;
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_active(cancel: &CancellationToken) -> QueueResult<()> {
    if cancel.is_cancelled() {
        return Err(QueueError::Cancelled);
    }
    Ok(())
}

/// Tokens carry the last returned ID as 8 big-endian bytes
fn encode_token(last_returned: SourceTaskId) -> PageToken {
    PageToken::from_bytes(last_returned.to_be_bytes().to_vec())
}

fn decode_token(token: &PageToken) -> QueueResult<SourceTaskId> {
    let bytes: [u8; 8] = token
        .as_bytes()
        .try_into()
        .map_err(|_| {
            QueueError::InvalidPageToken(format!(
                "expected 8 bytes, got {}",
                token.as_bytes().len()
            ))
        })?;
    Ok(SourceTaskId::from_be_bytes(bytes))
}

// =============================================================================
// Replication Queue Implementation
// =============================================================================

#[async_trait]
impl ReplicationQueue for MemoryQueue {
    async fn get_dlq_ack_level(&self, cancel: &CancellationToken) -> QueueResult<AckLevel> {
        ensure_active(cancel)?;
        Ok(*self.ack_level.read().await)
    }

    async fn get_messages_from_dlq(
        &self,
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        page_size: usize,
        page_token: Option<&PageToken>,
        cancel: &CancellationToken,
    ) -> QueueResult<Page> {
        ensure_active(cancel)?;

        let start = match page_token {
            Some(token) => decode_token(token)?.max(first_message_id),
            None => first_message_id,
        };
        if start >= last_message_id {
            return Ok(Page::empty());
        }

        let tasks = self.tasks.read().await;
        let mut range = tasks.range((Excluded(start), Included(last_message_id)));
        let page: Vec<ReplicationTask> =
            range.by_ref().take(page_size).map(|(_, task)| task.clone()).collect();

        let next_page_token = match (range.next(), page.last()) {
            (Some(_), Some(last)) => Some(encode_token(last.source_task_id)),
            _ => None,
        };

        debug!(
            first_message_id,
            last_message_id,
            returned = page.len(),
            has_more = next_page_token.is_some(),
            "Memory queue: page fetched"
        );

        Ok(Page::new(page, next_page_token))
    }

    async fn range_delete_messages_from_dlq(
        &self,
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        ensure_active(cancel)?;

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|id, _| *id <= first_message_id || *id > last_message_id);

        debug!(
            first_message_id,
            last_message_id,
            deleted = before - tasks.len(),
            "Memory queue: range deleted"
        );
        Ok(())
    }

    async fn delete_message_from_dlq(
        &self,
        message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        ensure_active(cancel)?;
        self.tasks.write().await.remove(&message_id);
        Ok(())
    }

    async fn update_dlq_ack_level(
        &self,
        ack_level: AckLevel,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        ensure_active(cancel)?;
        *self.ack_level.write().await = ack_level;
        Ok(())
    }

    async fn publish_to_dlq(
        &self,
        task: ReplicationTask,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        ensure_active(cancel)?;

        let mut last_published = self.last_published.write().await;
        if let Some(last) = *last_published {
            if task.source_task_id <= last {
                return Err(QueueError::OutOfOrder {
                    source_task_id: task.source_task_id,
                    last_published: last,
                });
            }
        }

        *last_published = Some(task.source_task_id);
        self.tasks.write().await.insert(task.source_task_id, task);
        Ok(())
    }

    async fn get_dlq_size(&self, cancel: &CancellationToken) -> QueueResult<u64> {
        ensure_active(cancel)?;
        Ok(self.tasks.read().await.len() as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use replay_domain::TaskAttributes;
    use uuid::Uuid;

    fn create_test_task(id: SourceTaskId) -> ReplicationTask {
        ReplicationTask::new(
            id,
            TaskAttributes::FailoverMarker {
                domain_id: Uuid::now_v7(),
                failover_version: id,
            },
        )
    }

    async fn seeded_queue(ack_level: AckLevel, ids: &[SourceTaskId]) -> MemoryQueue {
        let queue = MemoryQueue::with_ack_level(ack_level);
        let cancel = CancellationToken::new();
        for id in ids {
            queue.publish_to_dlq(create_test_task(*id), &cancel).await.unwrap();
        }
        queue
    }

    fn ids(page: &Page) -> Vec<SourceTaskId> {
        page.tasks.iter().map(|t| t.source_task_id).collect()
    }

    #[tokio::test]
    async fn test_fetch_respects_half_open_range() {
        let queue = seeded_queue(10, &[9, 10, 11, 12, 20, 21]).await;
        let cancel = CancellationToken::new();

        let page = queue.get_messages_from_dlq(10, 20, 100, None, &cancel).await.unwrap();

        assert_eq!(ids(&page), vec![11, 12, 20]);
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_paginates_with_token() {
        let queue = seeded_queue(0, &[1, 2, 3, 4, 5]).await;
        let cancel = CancellationToken::new();

        let first = queue.get_messages_from_dlq(0, 5, 2, None, &cancel).await.unwrap();
        assert_eq!(ids(&first), vec![1, 2]);
        let token = first.next_page_token.expect("more tasks remain");

        let second = queue.get_messages_from_dlq(0, 5, 2, Some(&token), &cancel).await.unwrap();
        assert_eq!(ids(&second), vec![3, 4]);

        let token = second.next_page_token.expect("one task remains");
        let third = queue.get_messages_from_dlq(0, 5, 2, Some(&token), &cancel).await.unwrap();
        assert_eq!(ids(&third), vec![5]);
        assert!(third.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_exact_page_has_no_token() {
        let queue = seeded_queue(0, &[1, 2]).await;
        let page = queue
            .get_messages_from_dlq(0, 10, 2, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&page), vec![1, 2]);
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_inverted_range_is_empty() {
        let queue = seeded_queue(0, &[1, 2, 3]).await;
        let page = queue
            .get_messages_from_dlq(3, 1, 10, None, &CancellationToken::new())
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rejects_foreign_token() {
        let queue = seeded_queue(0, &[1]).await;
        let token = PageToken::from_bytes(vec![1, 2, 3]);

        let result = queue
            .get_messages_from_dlq(0, 10, 10, Some(&token), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(QueueError::InvalidPageToken(_))));
    }

    #[tokio::test]
    async fn test_range_delete_only_touches_range() {
        let queue = seeded_queue(0, &[1, 2, 3, 4]).await;
        let cancel = CancellationToken::new();

        queue.range_delete_messages_from_dlq(1, 3, &cancel).await.unwrap();
        assert_eq!(queue.source_task_ids().await, vec![1, 4]);

        // Repeating the delete is a no-op
        queue.range_delete_messages_from_dlq(1, 3, &cancel).await.unwrap();
        assert_eq!(queue.source_task_ids().await, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_delete_missing_message_succeeds() {
        let queue = seeded_queue(0, &[1]).await;
        let cancel = CancellationToken::new();

        queue.delete_message_from_dlq(1, &cancel).await.unwrap();
        queue.delete_message_from_dlq(1, &cancel).await.unwrap();
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_ack_level_round_trip() {
        let queue = MemoryQueue::with_ack_level(10);
        let cancel = CancellationToken::new();

        assert_eq!(queue.get_dlq_ack_level(&cancel).await.unwrap(), 10);
        queue.update_dlq_ack_level(15, &cancel).await.unwrap();
        assert_eq!(queue.get_dlq_ack_level(&cancel).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_publish_rejects_non_increasing_id() {
        let queue = seeded_queue(0, &[5]).await;
        let cancel = CancellationToken::new();

        let result = queue.publish_to_dlq(create_test_task(5), &cancel).await;
        assert!(matches!(
            result,
            Err(QueueError::OutOfOrder {
                source_task_id: 5,
                last_published: 5,
            })
        ));

        // Deleting the tail does not reopen lower IDs
        queue.delete_message_from_dlq(5, &cancel).await.unwrap();
        let below = queue.publish_to_dlq(create_test_task(4), &cancel).await;
        let above = queue.publish_to_dlq(create_test_task(6), &cancel).await;
        assert!(below.is_err());
        assert!(above.is_ok());
    }

    #[tokio::test]
    async fn test_size_counts_physical_tasks() {
        let queue = seeded_queue(2, &[1, 2, 3]).await;
        let cancel = CancellationToken::new();
        assert_eq!(queue.get_dlq_size(&cancel).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_token_rejects_every_call() {
        let queue = seeded_queue(0, &[1]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let ack = queue.get_dlq_ack_level(&cancel).await;
        let delete = queue.delete_message_from_dlq(1, &cancel).await;
        let update = queue.update_dlq_ack_level(5, &cancel).await;
        assert!(ack.unwrap_err().is_cancelled());
        assert!(delete.unwrap_err().is_cancelled());
        assert!(update.unwrap_err().is_cancelled());

        // Nothing changed
        assert!(queue.contains(1).await);
        assert_eq!(queue.ack_level().await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let queue = seeded_queue(0, &[1, 2]).await;
        queue.clear(7).await;

        assert!(queue.is_empty().await);
        assert_eq!(queue.ack_level().await, 7);
        let cancel = CancellationToken::new();
        let republished = queue.publish_to_dlq(create_test_task(1), &cancel).await;
        assert!(republished.is_ok());
    }
}
