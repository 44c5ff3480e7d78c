//! # Configuration
//!
//! Environment-driven configuration for the operator.
//!
//! - `controller`: reconciliation, backoff and watch settings
//! - `server`: metrics/probe HTTP server settings

mod controller;
mod server;

pub use controller::{ControllerConfig, LogFormat};
pub use server::ServerConfig;
