//! # Status
//!
//! Derives the Wordpress status from the result of a pass and writes it.
//!
//! The status is informational: a failed write never changes the outcome of
//! the pass, and an unchanged phase and message is not written at all so the
//! operator does not trigger itself through its own watch.

use crate::controller::reconciler::reconcile::PipelineProgress;
use crate::controller::reconciler::types::{ReconcileError, Reconciler};
use crate::crd::{Condition, Tier, Wordpress, WordpressPhase, WordpressStatus};
use crate::store::ObjectKey;
use tracing::{debug, warn};

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_DATABASE_READY: &str = "DatabaseReady";

/// Phase, message and conditions describing a finished pass
///
/// `None` for a cancelled pass, which reports nothing.
#[must_use]
pub fn status_for(
    wordpress: &Wordpress,
    result: &Result<PipelineProgress, ReconcileError>,
) -> Option<WordpressStatus> {
    let (phase, message, database_ready) = match result {
        Ok(PipelineProgress::Created { tier, kind, key }) => (
            WordpressPhase::Provisioning,
            format!("Created {kind} {}", key.name),
            if *tier == Tier::Mysql { "Unknown" } else { "True" },
        ),
        Ok(PipelineProgress::GateClosed { tier }) => (
            WordpressPhase::WaitingForDatabase,
            format!("Waiting for the {tier} tier to become ready"),
            "False",
        ),
        Ok(PipelineProgress::Complete) => (
            WordpressPhase::Ready,
            "All sub-resources are ready".to_string(),
            "True",
        ),
        Err(ReconcileError::Cancelled) => return None,
        Err(e) => (WordpressPhase::Failed, e.to_string(), "Unknown"),
    };

    let previous = wordpress.status.as_ref();
    let (ready, ready_reason) = match phase {
        WordpressPhase::Ready => ("True", "ReconciliationSucceeded"),
        WordpressPhase::Failed => ("False", "ReconciliationFailed"),
        _ => ("False", "ReconciliationInProgress"),
    };
    let database_reason = match database_ready {
        "True" => "DeploymentAvailable",
        "False" => "DeploymentUnavailable",
        _ => "NotObserved",
    };

    Some(WordpressStatus {
        phase: Some(phase),
        message: Some(message.clone()),
        conditions: vec![
            condition(previous, CONDITION_READY, ready, ready_reason, Some(message)),
            condition(
                previous,
                CONDITION_DATABASE_READY,
                database_ready,
                database_reason,
                None,
            ),
        ],
        observed_generation: wordpress.metadata.generation,
        last_reconcile_time: Some(chrono::Utc::now().to_rfc3339()),
    })
}

/// Build a condition, keeping the previous transition time when the status did not flip
fn condition(
    previous: Option<&WordpressStatus>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: Option<String>,
) -> Condition {
    let last_transition_time = previous
        .and_then(|s| s.condition(condition_type))
        .filter(|c| c.status == status)
        .and_then(|c| c.last_transition_time.clone())
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        last_transition_time: Some(last_transition_time),
        reason: Some(reason.to_string()),
        message,
    }
}

/// Whether `next` differs from `current` in phase or message
#[must_use]
pub fn status_changed(current: Option<&WordpressStatus>, next: &WordpressStatus) -> bool {
    let Some(current) = current else {
        return true;
    };
    current.phase != next.phase || current.message != next.message
}

impl Reconciler {
    /// Record the result of a pass on the Wordpress object
    pub(crate) async fn record_status(
        &self,
        key: &ObjectKey,
        wordpress: &Wordpress,
        result: &Result<PipelineProgress, ReconcileError>,
    ) {
        let Some(status) = status_for(wordpress, result) else {
            return;
        };
        if !status_changed(wordpress.status.as_ref(), &status) {
            debug!(
                phase = ?status.phase,
                "Skipping status update - phase and message unchanged"
            );
            return;
        }

        if let Err(e) = self.store.update_wordpress_status(key, &status).await {
            warn!(resource = %key, error = %e, "Failed to update Wordpress status");
        }
    }
}
