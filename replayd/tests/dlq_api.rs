//! End-to-end tests for the DLQ HTTP API.
//!
//! Binds the router on an ephemeral port and drives it with a real client,
//! the way an operator would: inspect the backlog, replay it page by page,
//! then purge what is left.

use std::net::SocketAddr;
use std::sync::Arc;

use replay_exec::StubExecutor;
use replay_store::{MemoryQueue, ReplicationQueue};
use replay_testkit::{domain_task, seed_queue};
use replayd::api::{ErrorResponse, MergeResponse, ReadResponse, SizeResponse};
use replayd::{create_router, ApiState, Config};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn serve(queue: Arc<MemoryQueue>, executor: Arc<StubExecutor>) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(ApiState::new(
        queue,
        executor,
        Config::test().dlq,
        CancellationToken::new(),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.ok();
    });

    Ok(addr)
}

async fn size(client: &reqwest::Client, addr: SocketAddr) -> anyhow::Result<SizeResponse> {
    let response = client.get(format!("http://{}/dlq/size", addr)).send().await?;
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_operator_drains_backlog_then_purges() -> anyhow::Result<()> {
    let (queue, _) = seed_queue(10, &[11, 12, 13, 14, 15, 30]).await?;
    let queue = Arc::new(queue);
    let executor = Arc::new(StubExecutor::new());
    let addr = serve(queue.clone(), executor.clone()).await?;
    let client = reqwest::Client::new();

    // Inspect the backlog.
    let page: ReadResponse = client
        .get(format!(
            "http://{}/dlq/messages?last_message_id=20&page_size=10",
            addr
        ))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(page.count, 5);
    assert!(page.next_page_token.is_none());

    // Replay two tasks per call until the range is empty.
    for expected_ack in [12, 14, 15] {
        let response = client
            .post(format!("http://{}/dlq/merge", addr))
            .json(&json!({ "last_message_id": 20, "page_size": 2 }))
            .send()
            .await?;
        assert!(response.status().is_success());
        let merged: MergeResponse = response.json().await?;
        assert!(merged.next_page_token.is_none());
        assert_eq!(size(&client, addr).await?.ack_level, expected_ack);
    }
    assert_eq!(executor.applied_count().await, 5);

    // Task 30 is outside the merged range; purge it without replay.
    let response = client
        .post(format!("http://{}/dlq/purge", addr))
        .json(&json!({ "last_message_id": 30 }))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    let after = size(&client, addr).await?;
    assert_eq!(after.size, 0);
    assert_eq!(after.ack_level, 30);
    assert_eq!(executor.applied_count().await, 5);

    Ok(())
}

#[tokio::test]
async fn test_failed_merge_keeps_failing_task_for_retry() -> anyhow::Result<()> {
    let (queue, tasks) = seed_queue(10, &[11, 12, 13]).await?;
    let queue = Arc::new(queue);
    let executor = Arc::new(StubExecutor::new());
    executor.reject(tasks[1].attributes.clone()).await;
    let addr = serve(queue.clone(), executor.clone()).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/dlq/merge", addr))
        .json(&json!({ "last_message_id": 20 }))
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json().await?;
    assert!(error.error.contains("12"));
    assert_eq!(queue.source_task_ids().await, vec![12, 13]);

    // A later task published with a higher ID is unaffected.
    let cancel = CancellationToken::new();
    queue.publish_to_dlq(domain_task(40), &cancel).await?;
    assert_eq!(size(&client, addr).await?.size, 3);

    Ok(())
}
