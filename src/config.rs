//! Configuration Module
//!
//! Handles loading and managing store and server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default location of the state database, relative to the project directory.
pub const DEFAULT_DB_PATH: &str = ".opencode/state.db";

/// Store and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file
    pub db_path: PathBuf,
    /// How long a write waits on a locked database before failing, in milliseconds
    pub busy_timeout_ms: u64,
    /// Maximum number of pooled connections per process
    pub max_connections: u32,
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry purge interval in seconds, 0 disables the purge task
    pub purge_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STATE_DB_PATH` - Database file (default: `.opencode/state.db`)
    /// - `STATE_BUSY_TIMEOUT_MS` - Lock-wait bound in ms (default: 5000)
    /// - `STATE_MAX_CONNECTIONS` - Pool size (default: 4)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds (default: 0, disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("STATE_DB_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            busy_timeout_ms: parse_env("STATE_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms),
            max_connections: parse_env("STATE_MAX_CONNECTIONS", defaults.max_connections).max(1),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            purge_interval: parse_env("PURGE_INTERVAL", defaults.purge_interval),
        }
    }

    /// Returns a copy of this config pointing at another database file.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Lock-wait bound as a Duration.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout_ms: 5000,
            max_connections: 4,
            server_port: 3000,
            purge_interval: 0,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.db_path, PathBuf::from(".opencode/state.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.purge_interval, 0);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("STATE_DB_PATH");
        env::remove_var("STATE_BUSY_TIMEOUT_MS");
        env::remove_var("STATE_MAX_CONNECTIONS");
        env::remove_var("SERVER_PORT");
        env::remove_var("PURGE_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.purge_interval, 0);
    }

    #[test]
    fn test_with_db_path() {
        let config = Config::default().with_db_path("/tmp/other.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.server_port, 3000);
    }
}
