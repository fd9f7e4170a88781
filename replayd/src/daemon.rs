//! Daemon: runtime orchestrator.
//!
//! The Daemon ties together:
//! - Replication queue (DLQ storage)
//! - Task executor (applies replayed tasks)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Initialize components
//! 3. Start API server
//! 4. Wait for SIGINT
//! 5. Cancel in-flight operations and stop the server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use replay_exec::{StubExecutor, TaskExecutor};
use replay_store::{MemoryQueue, ReplicationQueue};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The replay daemon.
pub struct Daemon<Q: ReplicationQueue + 'static, X: TaskExecutor + 'static> {
    /// Configuration
    config: Config,
    /// DLQ storage
    queue: Arc<Q>,
    /// Applies replayed tasks
    executor: Arc<X>,
    /// Cancelled on shutdown
    shutdown: CancellationToken,
}

impl Daemon<MemoryQueue, StubExecutor> {
    /// Create a new daemon with stub components (for testing/development).
    pub fn new_stub(config: Config) -> Self {
        let queue = Arc::new(MemoryQueue::with_ack_level(config.dlq.initial_ack_level));
        let executor = Arc::new(StubExecutor::new());

        Self::new(config, queue, executor)
    }
}

impl<Q: ReplicationQueue + 'static, X: TaskExecutor + 'static> Daemon<Q, X> {
    /// Create a new daemon with provided components.
    pub fn new(config: Config, queue: Arc<Q>, executor: Arc<X>) -> Self {
        Self {
            config,
            queue,
            executor,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled when the daemon shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting replay daemon"
        );

        let api_addr = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Received shutdown signal");
            }
            _ = self.shutdown.cancelled() => {
                info!("Shutdown requested");
            }
        }

        self.shutdown().await
    }

    /// Start the API server.
    ///
    /// The server stops accepting connections once the shutdown token fires.
    async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let state = Arc::new(ApiState::new(
            self.queue.clone(),
            self.executor.clone(),
            self.config.dlq.clone(),
            self.shutdown.clone(),
        ));

        let router = create_router(state);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DaemonError::Config(format!("Failed to bind to {}: {}", addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let server = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = server.await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    /// Graceful shutdown.
    async fn shutdown(&self) -> DaemonResult<()> {
        info!("Initiating graceful shutdown");

        // Stops the server and fails in-flight merges between tasks.
        self.shutdown.cancel();

        // Fresh token: the shutdown one is cancelled by now.
        let cancel = CancellationToken::new();
        match self.queue.get_dlq_size(&cancel).await {
            Ok(remaining) => info!(remaining, "Shutdown complete"),
            Err(e) => warn!(error = %e, "Shutdown complete, DLQ size unavailable"),
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
