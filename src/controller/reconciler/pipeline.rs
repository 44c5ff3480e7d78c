//! # Pipeline
//!
//! Ordered tier stages of a Wordpress installation.
//!
//! Each stage ensures its sub-resources in order and may carry a readiness
//! gate; a closed gate stops the pass before any later stage runs. New tiers
//! are added by appending stages.

use crate::controller::reconciler::readiness::ReadinessGate;
use crate::crd::Tier;
use crate::store::ManagedKind;

/// One tier and the sub-resources it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub tier: Tier,
    /// Sub-resources ensured by this stage, in order
    pub kinds: Vec<ManagedKind>,
    /// Must be open before the next stage runs
    pub gate: Option<ReadinessGate>,
}

impl Stage {
    /// Stage ensuring storage claim, deployment and service of `tier`
    #[must_use]
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            kinds: ManagedKind::ORDERED.to_vec(),
            gate: None,
        }
    }

    #[must_use]
    pub fn gated_by(mut self, gate: ReadinessGate) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Stages run in order on every pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// MySQL first, gated on its deployment, then the Wordpress tier
    #[must_use]
    pub fn wordpress() -> Self {
        Self::new(vec![
            Stage::new(Tier::Mysql).gated_by(ReadinessGate::DeploymentReady),
            Stage::new(Tier::Wordpress),
        ])
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::wordpress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wordpress_pipeline() {
        let pipeline = Pipeline::wordpress();
        let stages = pipeline.stages();

        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].tier, Tier::Mysql);
        assert_eq!(stages[0].gate, Some(ReadinessGate::DeploymentReady));
        assert_eq!(stages[1].tier, Tier::Wordpress);
        assert_eq!(stages[1].gate, None);
        for stage in stages {
            assert_eq!(
                stage.kinds,
                vec![
                    ManagedKind::StorageClaim,
                    ManagedKind::Deployment,
                    ManagedKind::Service
                ]
            );
        }
    }
}
