//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::reconciler::pipeline::Pipeline;
use crate::store::{ObjectKey, ResourceStore, StoreError};
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors that abort a reconciliation pass
///
/// Every variant is retryable: re-running the pass from the top converges
/// without duplicating sub-resources.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to look up {kind} {key}: {source}")]
    Store {
        kind: &'static str,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to create {kind} {key}: {source}")]
    CreateFailed {
        kind: &'static str,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("reconciliation cancelled")]
    Cancelled,

    #[error("invalid object: {0}")]
    InvalidObject(String),
}

impl ReconcileError {
    /// Short label used for metrics and log fields
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::Store { .. } => "store-error",
            ReconcileError::CreateFailed { .. } => "create-failed",
            ReconcileError::Cancelled => "cancelled",
            ReconcileError::InvalidObject(_) => "invalid-object",
        }
    }
}

/// Result of a successful reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing left to do until a watched object changes
    Done,
    /// Invoke again after the given delay
    RequeueAfter(Duration),
}

impl From<ReconcileOutcome> for Action {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Done => Action::await_change(),
            ReconcileOutcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(start: Duration, max: Duration) -> Self {
        Self {
            backoff: FibonacciBackoff::new(start, max),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Reconciler context shared by every reconciliation
///
/// Holds the store handle explicitly; nothing is read from ambient state.
pub struct Reconciler {
    pub store: Arc<dyn ResourceStore>,
    pub pipeline: Pipeline,
    /// Delay before checking the database tier again
    pub database_ready_requeue: Duration,
    pub backoff_start: Duration,
    pub backoff_max: Duration,
    // Keyed by namespace/name, only touched from the error policy and after a success
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("pipeline", &self.pipeline)
            .field("database_ready_requeue", &self.database_ready_requeue)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, config: &ControllerConfig) -> Self {
        Self {
            store,
            pipeline: Pipeline::wordpress(),
            database_ready_requeue: config.database_ready_requeue_duration(),
            backoff_start: config.backoff_start_duration(),
            backoff_max: config.backoff_max_duration(),
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a failure for `key` and return the delay before the next attempt
    /// together with the number of consecutive failures
    pub fn next_backoff(&self, key: &ObjectKey) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| BackoffState::new(self.backoff_start, self.backoff_max));
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (self.backoff_start, 0)
            }
        }
    }

    /// Forget the failure history of `key`
    pub fn reset_backoff(&self, key: &ObjectKey) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                if let Some(state) = states.get_mut(&key.to_string()) {
                    state.reset();
                }
            }
            Err(e) => warn!("Failed to lock backoff_states: {}", e),
        }
    }

    /// Drop the failure history of `key`, once its object is gone
    pub fn forget_backoff(&self, key: &ObjectKey) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(&key.to_string());
            }
            Err(e) => warn!("Failed to lock backoff_states: {}", e),
        }
    }
}
