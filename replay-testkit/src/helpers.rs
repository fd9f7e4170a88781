//! Task fixtures and queue seeding helpers.

use replay_domain::{
    AckLevel, DomainOperation, DomainTaskAttributes, ReplicationTask, SourceTaskId, TaskAttributes,
};
use replay_store::{MemoryQueue, ReplicationQueue};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::recording::RecordingQueue;
use crate::Result;

/// Build a domain-update task with a fresh domain ID.
///
/// Every call yields distinct attributes, so a stub executor can reject
/// one task without rejecting its neighbours.
pub fn domain_task(source_task_id: SourceTaskId) -> ReplicationTask {
    ReplicationTask::new(
        source_task_id,
        TaskAttributes::Domain(DomainTaskAttributes {
            id: Uuid::now_v7(),
            name: format!("domain-{}", source_task_id),
            operation: DomainOperation::Update,
            failover_version: source_task_id,
        }),
    )
}

/// Create a queue at `ack_level` holding one domain task per ID.
///
/// Returns the queue and the published tasks, in ID order.
pub async fn seed_queue(
    ack_level: AckLevel,
    ids: &[SourceTaskId],
) -> Result<(MemoryQueue, Vec<ReplicationTask>)> {
    let queue = MemoryQueue::with_ack_level(ack_level);
    let cancel = CancellationToken::new();
    let mut tasks = Vec::with_capacity(ids.len());

    for &id in ids {
        let task = domain_task(id);
        queue.publish_to_dlq(task.clone(), &cancel).await?;
        tasks.push(task);
    }

    Ok((queue, tasks))
}

/// Same as [`seed_queue`], wrapped in a [`RecordingQueue`] with an empty call log.
pub async fn seed_recording_queue(
    ack_level: AckLevel,
    ids: &[SourceTaskId],
) -> Result<(RecordingQueue, Vec<ReplicationTask>)> {
    let (queue, tasks) = seed_queue(ack_level, ids).await?;
    Ok((RecordingQueue::new(queue), tasks))
}
