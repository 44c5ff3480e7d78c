//! # Runtime
//!
//! Process runtime for the operator.
//!
//! - `initialization`: rustls, tracing, metrics, HTTP server and client setup
//! - `watch_loop`: kube-runtime controller driving the reconciler
//! - `error_policy`: reconciliation backoff and watch error handling

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::{run_watch_loop, ControllerContext};
