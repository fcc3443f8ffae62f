//! Configuration management for the sync binary.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Sync configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the file-backed local store
    pub data_dir: PathBuf,
    /// PostgreSQL connection URL of the remote document store
    pub database_url: String,
    /// Remote connection pool size
    pub max_connections: u32,
    /// How long the remote transport waits for a connection
    pub connect_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("TANDEM_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.tandem"));

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;

        let max_connections = lookup("TANDEM_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidMaxConnections)?;

        let connect_timeout = lookup("TANDEM_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidConnectTimeout)?;

        Ok(Self {
            data_dir,
            database_url,
            max_connections,
            connect_timeout,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid TANDEM_MAX_CONNECTIONS value")]
    InvalidMaxConnections,

    #[error("Invalid TANDEM_CONNECT_TIMEOUT_SECS value")]
    InvalidConnectTimeout,
}
