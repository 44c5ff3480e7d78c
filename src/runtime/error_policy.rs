//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::crd::Wordpress;
use crate::controller::reconciler::ReconcileError;
use crate::observability;
use crate::runtime::watch_loop::ControllerContext;
use crate::store::ObjectKey;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per Wordpress object so one failing object
/// does not slow down the others.
pub fn handle_reconciliation_error(
    obj: Arc<Wordpress>,
    error: &ReconcileError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = obj.metadata.namespace.as_deref().unwrap_or("default");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors();
    error!(reason = error.reason(), "Reconciliation error for {}: {}", name, error);

    let key = ObjectKey::new(namespace, name);
    let (delay, error_count) = ctx.reconciler.next_backoff(&key);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    info!(
        "Retrying {} in {}ms (error count: {}, next attempt: {}, trigger source: error-backoff)",
        key,
        delay.as_millis(),
        error_count,
        next_trigger_time.to_rfc3339()
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}

/// Category of a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorClass {
    /// RBAC revoked or token expired
    Unauthorized,
    /// Resource version too old, the watch must be re-listed
    Expired,
    /// API server storage reinitializing
    TooManyRequests,
    /// Object or CRD missing
    NotFound,
    Other,
}

impl WatchErrorClass {
    /// Classify a watch error from its debug representation
    ///
    /// 404 is checked before 401: a plain-text 404 body shows up inside a
    /// `WatchFailed` chain that would otherwise look like an auth failure.
    #[must_use]
    pub fn classify(error: &str) -> Self {
        let is_not_found = error.contains("ObjectNotFound")
            || error.contains("404")
            || error.contains("not found");
        if is_not_found {
            return WatchErrorClass::NotFound;
        }
        if error.contains("401") || error.contains("Unauthorized") {
            return WatchErrorClass::Unauthorized;
        }
        if error.contains("410")
            || error.contains("too old resource version")
            || error.contains("Expired")
            || error.contains("Gone")
        {
            return WatchErrorClass::Expired;
        }
        if error.contains("429")
            || error.contains("storage is (re)initializing")
            || error.contains("TooManyRequests")
        {
            return WatchErrorClass::TooManyRequests;
        }
        WatchErrorClass::Other
    }
}

/// Handle watch stream errors with appropriate classification and backoff
///
/// Returns `None` to filter out the error (allow restart) or `Some(())` to continue.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &Arc<AtomicU64>,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );

    let class = WatchErrorClass::classify(error_string);
    async move {
        match class {
            WatchErrorClass::Unauthorized => {
                error!("Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired");
                error!("   Check the ClusterRole and ClusterRoleBinding of the wordpress-operator ServiceAccount:");
                error!("      kubectl auth can-i list wordpresses --as=system:serviceaccount:<namespace>:wordpress-operator --all-namespaces");
                warn!(
                    "Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                    watch_restart_delay.as_secs()
                );
                tokio::time::sleep(watch_restart_delay).await;
                None
            }
            WatchErrorClass::Expired => {
                warn!(error_type = "410", "watch.error.resource_version_expired");
                None
            }
            WatchErrorClass::TooManyRequests => {
                let current_backoff = backoff.load(Ordering::Relaxed);
                warn!(
                    "API server storage reinitializing (429), backing off for {}ms before restart...",
                    current_backoff
                );
                tokio::time::sleep(Duration::from_millis(current_backoff)).await;
                let new_backoff = current_backoff.saturating_mul(2).min(max_backoff_ms);
                backoff.store(new_backoff, Ordering::Relaxed);
                None
            }
            WatchErrorClass::NotFound => {
                warn!(
                    "Resource not found (404) - this may be normal if it was deleted or the Wordpress CRD is missing. Error: {}",
                    error_string
                );
                Some(())
            }
            WatchErrorClass::Other => {
                error!("Controller stream error: {}", error_string);
                tokio::time::sleep(watch_restart_delay).await;
                None
            }
        }
    }
    .instrument(error_span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_watch_errors() {
        assert_eq!(
            WatchErrorClass::classify("Api(ErrorResponse { code: 401, reason: \"Unauthorized\" })"),
            WatchErrorClass::Unauthorized
        );
        assert_eq!(
            WatchErrorClass::classify("WatchError(too old resource version: 123 (456))"),
            WatchErrorClass::Expired
        );
        assert_eq!(
            WatchErrorClass::classify("storage is (re)initializing"),
            WatchErrorClass::TooManyRequests
        );
        assert_eq!(
            WatchErrorClass::classify("connection reset by peer"),
            WatchErrorClass::Other
        );
    }

    #[test]
    fn test_not_found_wins_over_watch_failed() {
        assert_eq!(
            WatchErrorClass::classify(
                "WatchFailed(SerdeError(invalid type: integer `404`, expected Unauthorized))"
            ),
            WatchErrorClass::NotFound
        );
    }

    #[tokio::test]
    async fn test_too_many_requests_doubles_backoff() {
        let backoff = Arc::new(AtomicU64::new(1));
        let result =
            handle_watch_stream_error("TooManyRequests", &backoff, 3, Duration::ZERO).await;
        assert!(result.is_none());
        assert_eq!(backoff.load(Ordering::Relaxed), 2);

        handle_watch_stream_error("TooManyRequests", &backoff, 3, Duration::ZERO).await;
        assert_eq!(backoff.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_not_found_keeps_the_stream() {
        let backoff = Arc::new(AtomicU64::new(1));
        assert_eq!(
            handle_watch_stream_error("ObjectNotFound", &backoff, 3, Duration::ZERO).await,
            Some(())
        );
    }
}
