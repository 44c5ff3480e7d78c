//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager recorded on every object the operator writes
pub const FIELD_MANAGER: &str = "wordpress-operator";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Delay before re-checking a database tier that is not yet ready (seconds)
pub const DEFAULT_DATABASE_READY_REQUEUE_SECS: u64 = 5;

/// Default Fibonacci backoff starting value for failed reconciliations (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default Fibonacci backoff maximum value for failed reconciliations (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default upper bound on reconciliations running at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "wordpress_operator=info";

/// Label selector matching every object created by the operator
pub const MANAGED_BY_SELECTOR: &str = "app.kubernetes.io/managed-by=wordpress-operator";
