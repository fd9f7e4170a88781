//! Replication DLQ replay daemon
//!
//! Serves the DLQ read, purge and merge operations over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p replayd
//!
//! # Start with custom environment
//! REPLAY_ENV=test REPLAY_API_PORT=8091 cargo run -p replayd
//! ```
//!
//! # Environment Variables
//!
//! - `REPLAY_ENV`: Environment (test, development, production)
//! - `REPLAY_API_HOST`: API host (default: 0.0.0.0)
//! - `REPLAY_API_PORT`: API port (default: 8090)
//! - `REPLAY_DEFAULT_PAGE_SIZE`: Page size when a request gives none (default: 100)
//! - `REPLAY_MAX_PAGE_SIZE`: Largest accepted page size (default: 1000)
//! - `REPLAY_INITIAL_ACK_LEVEL`: Starting ack level of the in-memory queue (default: 0)
//! - `REPLAY_LOG_FORMAT`: pretty or json (default: pretty)

use replayd::{Config, Daemon, LogFormat};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it selects the log format
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("replayd=info".parse()?)
        .add_directive("replay_exec=info".parse()?);
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry().with(fmt::layer()).with(filter).init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        default_page_size = config.dlq.default_page_size,
        "Replication DLQ replay daemon"
    );

    // Create and run daemon
    let daemon = Daemon::new_stub(config);
    daemon.run().await?;

    Ok(())
}
