//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MS, DEFAULT_BACKOFF_START_MS, DEFAULT_DATABASE_READY_REQUEUE_SECS,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
    DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long to wait before re-checking a database tier that is not ready yet (seconds)
    pub database_ready_requeue_secs: u64,
    /// Fibonacci backoff starting value after a failed reconciliation (milliseconds)
    pub backoff_start_ms: u64,
    /// Fibonacci backoff ceiling after repeated failures (milliseconds)
    pub backoff_max_ms: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after the stream ends normally (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Maximum concurrent reconciliations across different Wordpress objects
    pub max_concurrent_reconciliations: u16,
    /// Namespace to watch. `None` watches every namespace.
    pub watch_namespace: Option<String>,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("text") {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            database_ready_requeue_secs: DEFAULT_DATABASE_READY_REQUEUE_SECS,
            backoff_start_ms: DEFAULT_BACKOFF_START_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_namespace: None,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            database_ready_requeue_secs: parse_or(
                &lookup,
                "DATABASE_READY_REQUEUE_SECS",
                DEFAULT_DATABASE_READY_REQUEUE_SECS,
            ),
            backoff_start_ms: parse_or(&lookup, "BACKOFF_START_MS", DEFAULT_BACKOFF_START_MS),
            backoff_max_ms: parse_or(&lookup, "BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            watch_restart_delay_secs: parse_or(
                &lookup,
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            watch_restart_delay_after_end_secs: parse_or(
                &lookup,
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            max_concurrent_reconciliations: parse_or(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            log_format: LogFormat::parse(&lookup("LOG_FORMAT").unwrap_or_default()),
        }
    }

    /// Get the database readiness requeue delay
    #[must_use]
    pub fn database_ready_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.database_ready_requeue_secs)
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get watch restart delay after end duration
    #[must_use]
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }

    /// Get backoff start duration
    #[must_use]
    pub fn backoff_start_duration(&self) -> Duration {
        Duration::from_millis(self.backoff_start_ms)
    }

    /// Get backoff max duration
    #[must_use]
    pub fn backoff_max_duration(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

/// Parse a value from the lookup or fall back to the default
pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
