//! # Reconciler
//!
//! Core reconciliation logic for `Wordpress` resources.
//!
//! The reconciler:
//! - Fetches the Wordpress object from the store
//! - Ensures the MySQL storage claim, deployment and service, in that order
//! - Waits for the MySQL deployment to become ready
//! - Ensures the Wordpress storage claim, deployment and service
//! - Records the outcome in the Wordpress status
//!
//! Sub-resources are only ever created, never updated or deleted. Cleanup is
//! left to the garbage collector through owner references.

pub mod ensure;
pub mod pipeline;
pub mod readiness;
pub mod reconcile;
pub mod status;
pub mod types;

// Re-export public API
pub use ensure::{ensure, EnsureResult};
pub use pipeline::{Pipeline, Stage};
pub use readiness::{deployment_ready, ReadinessGate};
pub use reconcile::PipelineProgress;
pub use types::{BackoffState, ReconcileError, ReconcileOutcome, Reconciler};
