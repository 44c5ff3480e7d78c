//! # Readiness
//!
//! Predicates deciding whether a tier is usable by the tiers after it.
//!
//! Gates are evaluated against the objects observed earlier in the same
//! pass, so they never issue store calls of their own.

use crate::store::ManagedResource;
use k8s_openapi::api::apps::v1::Deployment;

/// Whether every desired replica of `deployment` is ready and available
///
/// An unset replica count means one replica, and a count below one is
/// treated as one so a scaled-to-zero database never reads as ready.
#[must_use]
pub fn deployment_ready(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1)
        .max(1);
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };
    status.ready_replicas.unwrap_or(0) >= desired
        && status.available_replicas.unwrap_or(0) >= desired
}

/// Condition a stage must meet before the next stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessGate {
    /// The stage's deployment reports all replicas ready and available
    DeploymentReady,
}

impl ReadinessGate {
    /// Evaluate the gate over the objects a stage observed
    #[must_use]
    pub fn is_open(&self, observed: &[ManagedResource]) -> bool {
        match self {
            ReadinessGate::DeploymentReady => observed
                .iter()
                .find_map(ManagedResource::as_deployment)
                .is_some_and(deployment_ready),
        }
    }
}
