//! # Logging
//!
//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the operator logs at `LOG_LEVEL`.
//! `LOG_FORMAT=text` switches from JSON lines to human-readable output.

use crate::config::{ControllerConfig, LogFormat};
use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set
#[must_use]
pub fn default_filter(log_level: &str) -> String {
    let level = log_level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => format!("wordpress_operator={level}"),
        _ => DEFAULT_LOG_FILTER.to_string(),
    }
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &ControllerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true).with_target(true))
            .try_init()
            .context("Failed to initialize tracing subscriber")?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
            .context("Failed to initialize tracing subscriber")?,
    }
    Ok(())
}
