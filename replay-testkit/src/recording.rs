//! Recording queue: call log and fault injection over a `MemoryQueue`.

use std::sync::Mutex;

use async_trait::async_trait;
use replay_domain::{AckLevel, Page, PageToken, ReplicationTask, SourceTaskId};
use replay_store::{MemoryQueue, QueueError, QueueResult, ReplicationQueue};
use tokio_util::sync::CancellationToken;

/// One call observed by a [`RecordingQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCall {
    GetAckLevel,
    GetMessages {
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        page_size: usize,
        page_token: Option<PageToken>,
    },
    RangeDelete {
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
    },
    DeleteMessage(SourceTaskId),
    UpdateAckLevel(AckLevel),
    Publish(SourceTaskId),
    GetSize,
}

impl QueueCall {
    /// True for calls that change queue contents or the ack level
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            QueueCall::RangeDelete { .. }
                | QueueCall::DeleteMessage(_)
                | QueueCall::UpdateAckLevel(_)
                | QueueCall::Publish(_)
        )
    }
}

type CallMatcher = Box<dyn Fn(&QueueCall) -> bool + Send + Sync>;

struct Fault {
    matcher: CallMatcher,
    remaining: Option<usize>,
}

/// Queue wrapper that logs every call and fails the ones matching a fault.
///
/// Calls are recorded even when they fail. A failing call never reaches
/// the inner queue, so it leaves no side effect behind.
pub struct RecordingQueue {
    inner: MemoryQueue,
    calls: Mutex<Vec<QueueCall>>,
    faults: Mutex<Vec<Fault>>,
}

impl RecordingQueue {
    /// Wrap an existing queue.
    pub fn new(inner: MemoryQueue) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// The wrapped queue, for inspecting state without recording calls.
    pub fn inner(&self) -> &MemoryQueue {
        &self.inner
    }

    /// Fail every call matching `matcher`.
    pub fn fail_when<F>(&self, matcher: F)
    where
        F: Fn(&QueueCall) -> bool + Send + Sync + 'static,
    {
        self.push_fault(Box::new(matcher), None);
    }

    /// Fail the next call matching `matcher`, then let later matches through.
    pub fn fail_once_when<F>(&self, matcher: F)
    where
        F: Fn(&QueueCall) -> bool + Send + Sync + 'static,
    {
        self.push_fault(Box::new(matcher), Some(1));
    }

    /// All calls observed so far, in order.
    pub fn calls(&self) -> Vec<QueueCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change queue contents or the ack level.
    pub fn mutations(&self) -> Vec<QueueCall> {
        self.calls().into_iter().filter(QueueCall::is_mutation).collect()
    }

    fn push_fault(&self, matcher: CallMatcher, remaining: Option<usize>) {
        self.faults.lock().unwrap().push(Fault { matcher, remaining });
    }

    /// Record `call` and report an injected failure if a fault matches it.
    fn observe(&self, call: QueueCall) -> QueueResult<()> {
        self.calls.lock().unwrap().push(call.clone());

        let mut faults = self.faults.lock().unwrap();
        let hit = faults
            .iter_mut()
            .find(|f| f.remaining != Some(0) && (f.matcher)(&call));

        match hit {
            Some(fault) => {
                if let Some(remaining) = fault.remaining.as_mut() {
                    *remaining -= 1;
                }
                let reason = format!("injected fault on {:?}", call);
                Err(QueueError::unavailable(reason))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReplicationQueue for RecordingQueue {
    async fn get_dlq_ack_level(&self, cancel: &CancellationToken) -> QueueResult<AckLevel> {
        self.observe(QueueCall::GetAckLevel)?;
        self.inner.get_dlq_ack_level(cancel).await
    }

    async fn get_messages_from_dlq(
        &self,
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        page_size: usize,
        page_token: Option<&PageToken>,
        cancel: &CancellationToken,
    ) -> QueueResult<Page> {
        self.observe(QueueCall::GetMessages {
            first_message_id,
            last_message_id,
            page_size,
            page_token: page_token.cloned(),
        })?;
        self.inner
            .get_messages_from_dlq(
                first_message_id,
                last_message_id,
                page_size,
                page_token,
                cancel,
            )
            .await
    }

    async fn range_delete_messages_from_dlq(
        &self,
        first_message_id: SourceTaskId,
        last_message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        self.observe(QueueCall::RangeDelete {
            first_message_id,
            last_message_id,
        })?;
        self.inner
            .range_delete_messages_from_dlq(first_message_id, last_message_id, cancel)
            .await
    }

    async fn delete_message_from_dlq(
        &self,
        message_id: SourceTaskId,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        self.observe(QueueCall::DeleteMessage(message_id))?;
        self.inner.delete_message_from_dlq(message_id, cancel).await
    }

    async fn update_dlq_ack_level(
        &self,
        ack_level: AckLevel,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        self.observe(QueueCall::UpdateAckLevel(ack_level))?;
        self.inner.update_dlq_ack_level(ack_level, cancel).await
    }

    async fn publish_to_dlq(
        &self,
        task: ReplicationTask,
        cancel: &CancellationToken,
    ) -> QueueResult<()> {
        self.observe(QueueCall::Publish(task.source_task_id))?;
        self.inner.publish_to_dlq(task, cancel).await
    }

    async fn get_dlq_size(&self, cancel: &CancellationToken) -> QueueResult<u64> {
        self.observe(QueueCall::GetSize)?;
        self.inner.get_dlq_size(cancel).await
    }
}
