//! HTTP API for the replay daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Reading a page of quarantined tasks
//! - Publishing a task to the DLQ (development aid)
//! - DLQ size and ack level
//! - Purge (discard without replay)
//! - Merge (replay one page)
//!
//! Page tokens travel as URL-safe base64 strings.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use replay_domain::{
    AckLevel, Page, PageToken, ReplicationTask, ReplicationTaskType, SourceTaskId, TaskAttributes,
};
use replay_exec::{DlqError, DlqMessageHandler, TaskExecutor};
use replay_store::{QueueError, ReplicationQueue};

use crate::config::DlqConfig;
use crate::error::DaemonError;

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<Q: ReplicationQueue + 'static, X: TaskExecutor + 'static> {
    /// Read, purge and merge over the queue
    pub handler: DlqMessageHandler<Q, X>,
    /// Queue, for publish and size
    pub queue: Arc<Q>,
    /// Page size limits
    pub dlq: DlqConfig,
    /// Serializes purge and merge
    pub mutation_lock: Mutex<()>,
    /// Cancelled on daemon shutdown; requests run on child tokens
    pub shutdown: CancellationToken,
}

impl<Q: ReplicationQueue + 'static, X: TaskExecutor + 'static> ApiState<Q, X> {
    /// Create API state over a queue and executor.
    pub fn new(
        queue: Arc<Q>,
        executor: Arc<X>,
        dlq: DlqConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            handler: DlqMessageHandler::new(queue.clone(), executor),
            queue,
            dlq,
            mutation_lock: Mutex::new(()),
            shutdown,
        }
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query for reading a page.
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    pub last_message_id: SourceTaskId,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

/// One page of quarantined tasks.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadResponse {
    pub tasks: Vec<ReplicationTask>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Request to publish a task into the DLQ.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub source_task_id: SourceTaskId,
    pub attributes: TaskAttributes,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
}

/// Response after publishing a task.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub source_task_id: SourceTaskId,
    pub task_type: ReplicationTaskType,
}

/// DLQ size and ack level.
#[derive(Debug, Serialize, Deserialize)]
pub struct SizeResponse {
    pub size: u64,
    pub ack_level: AckLevel,
}

/// Request to purge up to a bound.
#[derive(Debug, Deserialize)]
pub struct PurgeRequest {
    pub last_message_id: SourceTaskId,
}

/// Request to merge one page.
///
/// Merge always starts at the ack level; a non-empty `page_token` is
/// answered with 400.
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub last_message_id: SourceTaskId,
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

/// Merge result.
#[derive(Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub next_page_token: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<Q, X>(state: Arc<ApiState<Q, X>>) -> Router
where
    Q: ReplicationQueue + 'static,
    X: TaskExecutor + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/dlq/messages", get(read_handler).post(publish_handler))
        .route("/dlq/size", get(size_handler))
        .route("/dlq/purge", post(purge_handler))
        .route("/dlq/merge", post(merge_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Read one page of `(ack_level, last_message_id]`.
async fn read_handler<Q, X>(
    State(state): State<Arc<ApiState<Q, X>>>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<ReadResponse>, (StatusCode, Json<ErrorResponse>)>
where
    Q: ReplicationQueue + 'static,
    X: TaskExecutor + 'static,
{
    let page_size = resolve_page_size(&state.dlq, query.page_size).map_err(to_error_response)?;
    let page_token =
        decode_page_token(query.page_token.as_deref()).map_err(to_error_response)?;

    let cancel = state.shutdown.child_token();
    let Page {
        tasks,
        next_page_token,
    } = state
        .handler
        .read(
            query.last_message_id,
            page_size,
            page_token.as_ref(),
            &cancel,
        )
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(ReadResponse {
        count: tasks.len(),
        tasks,
        next_page_token: next_page_token.as_ref().map(encode_page_token),
    }))
}

/// Publish a task (for development and testing).
async fn publish_handler<Q, X>(
    State(state): State<Arc<ApiState<Q, X>>>,
    Json(req): Json<PublishRequest>,
) -> Result<(StatusCode, Json<PublishResponse>), (StatusCode, Json<ErrorResponse>)>
where
    Q: ReplicationQueue + 'static,
    X: TaskExecutor + 'static,
{
    let task_type = req.attributes.task_type();
    let task = ReplicationTask::from_parts(
        req.source_task_id,
        task_type,
        req.attributes,
        req.creation_time,
    )
    .map_err(|e| to_error_response(e.into()))?;

    let cancel = state.shutdown.child_token();
    state
        .queue
        .publish_to_dlq(task, &cancel)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    info!(source_task_id = req.source_task_id, %task_type, "Published task to DLQ");

    Ok((
        StatusCode::CREATED,
        Json(PublishResponse {
            source_task_id: req.source_task_id,
            task_type,
        }),
    ))
}

/// DLQ size and current ack level.
async fn size_handler<Q, X>(
    State(state): State<Arc<ApiState<Q, X>>>,
) -> Result<Json<SizeResponse>, (StatusCode, Json<ErrorResponse>)>
where
    Q: ReplicationQueue + 'static,
    X: TaskExecutor + 'static,
{
    let cancel = state.shutdown.child_token();
    let size = state
        .queue
        .get_dlq_size(&cancel)
        .await
        .map_err(|e| to_error_response(e.into()))?;
    let ack_level = state
        .queue
        .get_dlq_ack_level(&cancel)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(SizeResponse { size, ack_level }))
}

/// Discard every task up to `last_message_id`.
async fn purge_handler<Q, X>(
    State(state): State<Arc<ApiState<Q, X>>>,
    Json(req): Json<PurgeRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)>
where
    Q: ReplicationQueue + 'static,
    X: TaskExecutor + 'static,
{
    let _guard = state.mutation_lock.lock().await;
    let cancel = state.shutdown.child_token();
    state
        .handler
        .purge(req.last_message_id, &cancel)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replay one page up to `last_message_id`.
async fn merge_handler<Q, X>(
    State(state): State<Arc<ApiState<Q, X>>>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, (StatusCode, Json<ErrorResponse>)>
where
    Q: ReplicationQueue + 'static,
    X: TaskExecutor + 'static,
{
    let page_size = resolve_page_size(&state.dlq, req.page_size).map_err(to_error_response)?;
    let page_token = decode_page_token(req.page_token.as_deref()).map_err(to_error_response)?;

    let _guard = state.mutation_lock.lock().await;
    let cancel = state.shutdown.child_token();
    let next = state
        .handler
        .merge(req.last_message_id, page_size, page_token.as_ref(), &cancel)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(MergeResponse {
        next_page_token: next.as_ref().map(encode_page_token),
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Zero passes through so the handler rejects it uniformly.
fn resolve_page_size(dlq: &DlqConfig, requested: Option<usize>) -> Result<usize, DaemonError> {
    match requested {
        None => Ok(dlq.default_page_size),
        Some(size) if size > dlq.max_page_size => Err(DlqError::InvalidRequest(format!(
            "page size {} exceeds maximum {}",
            size, dlq.max_page_size
        ))
        .into()),
        Some(size) => Ok(size),
    }
}

fn decode_page_token(token: Option<&str>) -> Result<Option<PageToken>, DaemonError> {
    match token {
        None | Some("") => Ok(None),
        Some(encoded) => URL_SAFE_NO_PAD
            .decode(encoded)
            .map(|bytes| Some(PageToken::from_bytes(bytes)))
            .map_err(|e| {
                let reason = format!("invalid page token: {}", e);
                DlqError::InvalidRequest(reason).into()
            }),
    }
}

fn encode_page_token(token: &PageToken) -> String {
    URL_SAFE_NO_PAD.encode(token.as_bytes())
}

fn to_error_response(error: DaemonError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        DaemonError::Domain(_)
        | DaemonError::Dlq(DlqError::InvalidRequest(_))
        | DaemonError::Dlq(DlqError::QueueUnavailable(QueueError::InvalidPageToken(_)))
        | DaemonError::Queue(QueueError::InvalidPageToken(_)) => StatusCode::BAD_REQUEST,
        DaemonError::Dlq(DlqError::ExecutionFailure { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        DaemonError::Queue(QueueError::OutOfOrder { .. }) => StatusCode::CONFLICT,
        DaemonError::Dlq(DlqError::QueueUnavailable(_) | DlqError::Cancelled)
        | DaemonError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
        DaemonError::Config(_) | DaemonError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================
