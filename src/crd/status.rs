//! # Wordpress Status
//!
//! Status types for tracking reconciliation state and conditions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the Wordpress resource
///
/// Written by the operator only; the spec is never modified.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WordpressStatus {
    /// Current phase of reconciliation
    #[serde(default)]
    pub phase: Option<WordpressPhase>,
    /// Human-readable description of current state
    /// Examples: "Created PersistentVolumeClaim blog-mysql-pvc", "Waiting for MySQL to become ready"
    #[serde(default)]
    pub message: Option<String>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Generation of the spec the status was computed from
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Last reconciliation time (RFC3339)
    #[serde(default)]
    pub last_reconcile_time: Option<String>,
}

impl WordpressStatus {
    /// Look up a condition by type
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}

/// Lifecycle phase reported on the Wordpress status
///
/// A Wordpress object that was never reconciled has no phase.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
pub enum WordpressPhase {
    /// Sub-resources are being created
    Provisioning,
    /// Database tier exists but is not ready, the Wordpress tier is on hold
    WaitingForDatabase,
    /// Every sub-resource exists and the database tier is ready
    Ready,
    /// Last reconciliation failed, it will be retried
    Failed,
}

impl WordpressPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WordpressPhase::Provisioning => "Provisioning",
            WordpressPhase::WaitingForDatabase => "WaitingForDatabase",
            WordpressPhase::Ready => "Ready",
            WordpressPhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for WordpressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}
