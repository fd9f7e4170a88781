//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use replay_domain::AckLevel;
use std::env;
use std::str::FromStr;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// DLQ replay configuration
    pub dlq: DlqConfig,

    /// Log output format
    pub log_format: LogFormat,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// DLQ replay configuration.
#[derive(Debug, Clone)]
pub struct DlqConfig {
    /// Page size used when a request does not give one
    pub default_page_size: usize,
    /// Largest page size a request may ask for
    pub max_page_size: usize,
    /// Ack level of the in-memory queue at startup
    pub initial_ack_level: AckLevel,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses stubs)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let api = Self::load_api_config()?;
        let dlq = Self::load_dlq_config()?;
        let log_format = Self::load_log_format()?;

        Ok(Self {
            api,
            dlq,
            log_format,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            dlq: DlqConfig {
                default_page_size: 100,
                max_page_size: 1000,
                initial_ack_level: 0,
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Test,
        }
    }

    fn load_environment() -> DaemonResult<Environment> {
        let env_str = env::var("REPLAY_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid REPLAY_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config() -> DaemonResult<ApiConfig> {
        let host = env::var("REPLAY_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = Self::load_parsed_env("REPLAY_API_PORT", 8090u16)?;

        Ok(ApiConfig { host, port })
    }

    fn load_dlq_config() -> DaemonResult<DlqConfig> {
        let default_page_size = Self::load_parsed_env("REPLAY_DEFAULT_PAGE_SIZE", 100usize)?;
        let max_page_size = Self::load_parsed_env("REPLAY_MAX_PAGE_SIZE", 1000usize)?;
        let initial_ack_level = Self::load_parsed_env("REPLAY_INITIAL_ACK_LEVEL", 0 as AckLevel)?;

        if default_page_size == 0 {
            return Err(DaemonError::Config(
                "REPLAY_DEFAULT_PAGE_SIZE must be positive".to_string(),
            ));
        }
        if default_page_size > max_page_size {
            return Err(DaemonError::Config(format!(
                "REPLAY_DEFAULT_PAGE_SIZE ({}) exceeds REPLAY_MAX_PAGE_SIZE ({})",
                default_page_size, max_page_size
            )));
        }

        Ok(DlqConfig {
            default_page_size,
            max_page_size,
            initial_ack_level,
        })
    }

    fn load_log_format() -> DaemonResult<LogFormat> {
        let format = env::var("REPLAY_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        match format.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(DaemonError::Config(format!(
                "Invalid REPLAY_LOG_FORMAT: {}. Expected: pretty, json",
                other
            ))),
        }
    }

    fn load_parsed_env<T: FromStr>(key: &str, default: T) -> DaemonResult<T> {
        match env::var(key) {
            Ok(val) => val
                .parse::<T>()
                .map_err(|_| DaemonError::Config(format!("Invalid {key}: {val}"))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8090,
            },
            dlq: DlqConfig {
                default_page_size: 100,
                max_page_size: 1000,
                initial_ack_level: 0,
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.port, 8090);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.environment, Environment::Test);
    }

    #[test]
    fn test_dlq_config_defaults() {
        let config = Config::default();

        assert_eq!(config.dlq.default_page_size, 100);
        assert_eq!(config.dlq.max_page_size, 1000);
        assert_eq!(config.dlq.initial_ack_level, 0);
    }

    #[test]
    fn test_parsed_env_rejects_garbage() {
        // Unique key so parallel tests cannot interfere.
        env::set_var("REPLAY_TEST_PARSE_GARBAGE", "not-a-number");

        let result = Config::load_parsed_env("REPLAY_TEST_PARSE_GARBAGE", 5usize);

        assert!(matches!(result, Err(DaemonError::Config(_))));
        env::remove_var("REPLAY_TEST_PARSE_GARBAGE");
    }

    #[test]
    fn test_parsed_env_falls_back_to_default() {
        let result = Config::load_parsed_env("REPLAY_TEST_PARSE_UNSET", 7usize).unwrap();

        assert_eq!(result, 7);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
