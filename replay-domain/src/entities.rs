//! Replication task entities
//!
//! A replication task is a metadata-change record streamed from a source
//! cluster. Tasks that could not be applied by live replication sit in the
//! DLQ until an operator replays or purges them.

use crate::value_objects::{DomainError, SourceTaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Task Type
// =============================================================================

/// Discriminant of a replication task payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationTaskType {
    /// Domain metadata change (create/update)
    Domain,
    /// Shard replication progress marker
    SyncShardStatus,
    /// Workflow history batch
    HistoryV2,
    /// Domain failover notification
    FailoverMarker,
}

impl ReplicationTaskType {
    /// Stable name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationTaskType::Domain => "domain",
            ReplicationTaskType::SyncShardStatus => "sync_shard_status",
            ReplicationTaskType::HistoryV2 => "history_v2",
            ReplicationTaskType::FailoverMarker => "failover_marker",
        }
    }
}

impl fmt::Display for ReplicationTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Task Attributes
// =============================================================================

/// Kind of change carried by a domain task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainOperation {
    /// Domain registered on the source cluster
    Create,
    /// Existing domain changed
    Update,
}

/// Domain metadata replicated from the source cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTaskAttributes {
    /// Domain ID
    pub id: Uuid,
    /// Domain name
    pub name: String,
    /// Create or update
    pub operation: DomainOperation,
    /// Failover version the change was made at
    pub failover_version: i64,
}

/// Typed payload consumed by a task executor.
///
/// The variant determines the task's [`ReplicationTaskType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskAttributes {
    /// Domain metadata change
    Domain(DomainTaskAttributes),

    /// Shard replication progress
    #[allow(missing_docs)]
    SyncShardStatus {
        source_cluster: String,
        shard_id: i32,
        timestamp: DateTime<Utc>,
    },

    /// Workflow history batch
    #[allow(missing_docs)]
    HistoryV2 {
        domain_id: Uuid,
        workflow_id: String,
        run_id: Uuid,
    },

    /// Domain failover notification
    #[allow(missing_docs)]
    FailoverMarker {
        domain_id: Uuid,
        failover_version: i64,
    },
}

impl TaskAttributes {
    /// Task type implied by this payload
    pub fn task_type(&self) -> ReplicationTaskType {
        match self {
            TaskAttributes::Domain(_) => ReplicationTaskType::Domain,
            TaskAttributes::SyncShardStatus { .. } => ReplicationTaskType::SyncShardStatus,
            TaskAttributes::HistoryV2 { .. } => ReplicationTaskType::HistoryV2,
            TaskAttributes::FailoverMarker { .. } => ReplicationTaskType::FailoverMarker,
        }
    }
}

// =============================================================================
// Replication Task
// =============================================================================

/// A quarantined replication task.
///
/// Immutable once published; `task_type` always agrees with `attributes`.
/// Deserialization enforces that agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReplicationTask")]
pub struct ReplicationTask {
    /// Position in the source cluster's replication stream
    pub source_task_id: SourceTaskId,
    /// Payload discriminant
    pub task_type: ReplicationTaskType,
    /// Typed payload
    pub attributes: TaskAttributes,
    /// When the source cluster created the task, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
}

impl ReplicationTask {
    /// Create a task, deriving its type from the payload
    pub fn new(source_task_id: SourceTaskId, attributes: TaskAttributes) -> Self {
        Self {
            source_task_id,
            task_type: attributes.task_type(),
            attributes,
            creation_time: None,
        }
    }

    /// Create a task with an explicitly declared type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSourceTaskId` for negative IDs and
    /// `DomainError::TaskTypeMismatch` when `task_type` disagrees with
    /// `attributes`.
    pub fn from_parts(
        source_task_id: SourceTaskId,
        task_type: ReplicationTaskType,
        attributes: TaskAttributes,
        creation_time: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if source_task_id < 0 {
            return Err(DomainError::InvalidSourceTaskId(source_task_id));
        }

        let actual = attributes.task_type();
        if actual != task_type {
            return Err(DomainError::TaskTypeMismatch {
                declared: task_type.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(Self {
            source_task_id,
            task_type,
            attributes,
            creation_time,
        })
    }

    /// Stamp the time the task was created on the source cluster
    pub fn with_creation_time(mut self, creation_time: DateTime<Utc>) -> Self {
        self.creation_time = Some(creation_time);
        self
    }
}

/// Unvalidated wire shape of a [`ReplicationTask`]
#[derive(Deserialize)]
struct RawReplicationTask {
    source_task_id: SourceTaskId,
    task_type: ReplicationTaskType,
    attributes: TaskAttributes,
    #[serde(default)]
    creation_time: Option<DateTime<Utc>>,
}

impl TryFrom<RawReplicationTask> for ReplicationTask {
    type Error = DomainError;

    fn try_from(raw: RawReplicationTask) -> Result<Self, Self::Error> {
        ReplicationTask::from_parts(
            raw.source_task_id,
            raw.task_type,
            raw.attributes,
            raw.creation_time,
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn failover_marker() -> TaskAttributes {
        TaskAttributes::FailoverMarker {
            domain_id: Uuid::now_v7(),
            failover_version: 42,
        }
    }

    #[test]
    fn test_new_derives_task_type() {
        let task = ReplicationTask::new(11, failover_marker());
        assert_eq!(task.task_type, ReplicationTaskType::FailoverMarker);
        assert!(task.creation_time.is_none());
    }

    #[test]
    fn test_from_parts_rejects_mismatched_type() {
        let result =
            ReplicationTask::from_parts(11, ReplicationTaskType::Domain, failover_marker(), None);

        assert_eq!(
            result,
            Err(DomainError::TaskTypeMismatch {
                declared: "domain".to_string(),
                actual: "failover_marker".to_string(),
            })
        );
    }

    #[test]
    fn test_from_parts_rejects_negative_id() {
        let result = ReplicationTask::from_parts(
            -1,
            ReplicationTaskType::FailoverMarker,
            failover_marker(),
            None,
        );
        assert_eq!(result, Err(DomainError::InvalidSourceTaskId(-1)));
    }

    #[test]
    fn test_deserialize_validates_type() {
        let json = serde_json::json!({
            "source_task_id": 12,
            "task_type": "history_v2",
            "attributes": {
                "kind": "failover_marker",
                "domain_id": Uuid::now_v7(),
                "failover_version": 3
            }
        });

        let result: Result<ReplicationTask, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_shape() {
        let task = ReplicationTask::new(
            7,
            TaskAttributes::HistoryV2 {
                domain_id: Uuid::nil(),
                workflow_id: "wf-1".to_string(),
                run_id: Uuid::nil(),
            },
        );

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["source_task_id"], 7);
        assert_eq!(json["task_type"], "history_v2");
        assert_eq!(json["attributes"]["kind"], "history_v2");
        assert!(json.get("creation_time").is_none());

        let parsed: ReplicationTask = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, task);
    }
}
