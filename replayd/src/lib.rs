//! Replication DLQ Replay Daemon Library
//!
//! Runtime that exposes DLQ inspection, purge and replay over HTTP.
//!
//! # Architecture
//!
//! ```text
//! Operator → API Server → DlqMessageHandler → ReplicationQueue
//!                                           → TaskExecutor
//! ```
//!
//! # Components
//!
//! - **Daemon**: Main runtime orchestrator
//! - **API**: HTTP endpoints for operators
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use replayd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new_stub(config);
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, DlqConfig, Environment, LogFormat};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
