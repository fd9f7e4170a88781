//! Replication queue trait definition (Port)
//!
//! The queue is the durable, ordered store behind a DLQ. Implementations
//! can be a database table, a log segment, or in-memory for testing.
//!
//! All ranges are half-open: `(first_message_id, last_message_id]`.
//! Every call receives the caller's cancellation token and should return
//! `QueueError::Cancelled` once it fires.

use async_trait::async_trait;
use replay_domain::{AckLevel, Page, PageToken, ReplicationTask, SourceTaskId};
use tokio_util::sync::CancellationToken;

use crate::error::QueueResult;

/// Port for DLQ storage
#[async_trait]
pub trait ReplicationQueue: Send + Sync {
    /// Read the persisted ack level
    async fn get_dlq_ack_level(&self, cancel: &CancellationToken) -> QueueResult<AckLevel>;

    /// Fetch up to `page_size` tasks with IDs in `(first_message_id, last_message_id]`.
    ///
    /// `page_token` resumes a previous fetch over the same range.
    async fn get_messages_from_dlq(
        &self,
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        page_size: usize,
        page_token: Option<&PageToken>,
        cancel: &CancellationToken,
    ) -> QueueResult<Page>;

    /// Delete every task with ID in `(first_message_id, last_message_id]`
    async fn range_delete_messages_from_dlq(
        &self,
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> QueueResult<()>;

    /// Delete a single task. Deleting a missing ID succeeds.
    async fn delete_message_from_dlq(
        &self,
        message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> QueueResult<()>;

    /// Persist a new ack level
    async fn update_dlq_ack_level(
        &self,
        ack_level: AckLevel,
        cancel: &CancellationToken,
    ) -> QueueResult<()>;

    /// Append a task. IDs must strictly increase across publishes.
    async fn publish_to_dlq(
        &self,
        task: ReplicationTask,
        cancel: &CancellationToken,
    ) -> QueueResult<()>;

    /// Number of tasks physically present, including any below the ack level
    async fn get_dlq_size(&self, cancel: &CancellationToken) -> QueueResult<u64>;
}
