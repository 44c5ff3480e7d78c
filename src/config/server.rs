//! # Server Configuration
//!
//! Settings for the metrics and probe HTTP server.

use crate::config::controller::parse_or;
use crate::constants::{
    DEFAULT_METRICS_PORT, DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port serving `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// How long startup waits for the server to bind (seconds)
    pub startup_timeout_secs: u64,
    /// Poll interval while waiting for the server to bind (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            metrics_port: parse_or(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT),
            startup_timeout_secs: parse_or(
                &lookup,
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            poll_interval_ms: parse_or(
                &lookup,
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }

    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_port_override() {
        let config = ServerConfig::from_lookup(|key| {
            (key == "METRICS_PORT").then(|| "9090".to_string())
        });
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.startup_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_out_of_range_port_uses_default() {
        let config = ServerConfig::from_lookup(|key| {
            (key == "METRICS_PORT").then(|| "70000".to_string())
        });
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
    }
}
