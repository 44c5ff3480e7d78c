//! # Reconcile
//!
//! One reconciliation pass over a Wordpress object.
//!
//! ## Flow
//!
//! 1. Fetch the Wordpress object; a missing object is treated as deleted
//! 2. Run the pipeline stages in order, ensuring each sub-resource in turn
//! 3. Stop as soon as a sub-resource is created: the owned-object watch
//!    triggers the next pass
//! 4. Stop with a delayed requeue when a stage gate is closed
//! 5. Record the status and report `Done` once every stage passed
//!
//! Every pass starts from the store, so nothing is carried between passes.

use crate::controller::reconciler::ensure::{cancellable, ensure, EnsureResult};
use crate::controller::reconciler::types::{ReconcileError, ReconcileOutcome, Reconciler};
use crate::crd::{Tier, Wordpress};
use crate::observability;
use crate::store::{ManagedKind, ObjectKey};
use crate::templates;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};

/// How far a pass got through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineProgress {
    /// A sub-resource was just created, the pass stopped there
    Created {
        tier: Tier,
        kind: ManagedKind,
        key: ObjectKey,
    },
    /// Every sub-resource of `tier` exists but its gate is closed
    GateClosed { tier: Tier },
    /// Every stage ran to the end
    Complete,
}

impl Reconciler {
    /// Reconcile the Wordpress object identified by `key`
    ///
    /// Store calls race against `token`; once it is cancelled the pass
    /// returns [`ReconcileError::Cancelled`] without reporting anything.
    pub async fn reconcile(
        &self,
        key: &ObjectKey,
        token: &CancellationToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let span = tracing::info_span!(
            "controller.reconcile",
            resource.kind = "Wordpress",
            resource.name = key.name.as_str(),
            resource.namespace = key.namespace.as_str()
        );

        async {
            observability::metrics::increment_reconciliations();
            let start = Instant::now();

            let result = self.reconcile_once(key, token).await;

            observability::metrics::observe_reconciliation_duration(
                start.elapsed().as_secs_f64(),
            );
            if result.is_ok() {
                self.reset_backoff(key);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn reconcile_once(
        &self,
        key: &ObjectKey,
        token: &CancellationToken,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let wordpress = match cancellable(token, self.store.get_wordpress(key)).await? {
            Ok(wordpress) => wordpress,
            Err(e) if e.is_not_found() => {
                debug!("Wordpress not found, assuming it was deleted");
                self.forget_backoff(key);
                return Ok(ReconcileOutcome::Done);
            }
            Err(source) => {
                return Err(ReconcileError::Store {
                    kind: "Wordpress",
                    key: key.clone(),
                    source,
                })
            }
        };

        let progress = self.run_pipeline(&wordpress, token).await;
        self.record_status(key, &wordpress, &progress).await;

        match progress? {
            PipelineProgress::Created { .. } => Ok(ReconcileOutcome::Done),
            PipelineProgress::GateClosed { tier } => {
                info!(
                    tier = %tier,
                    delay_secs = self.database_ready_requeue.as_secs(),
                    "{} tier not ready, requeueing", tier
                );
                observability::metrics::increment_database_wait_requeues();
                observability::metrics::increment_requeues_total("waiting-for-database");
                Ok(ReconcileOutcome::RequeueAfter(self.database_ready_requeue))
            }
            PipelineProgress::Complete => {
                info!("Wordpress reconciled, all sub-resources ready");
                Ok(ReconcileOutcome::Done)
            }
        }
    }

    /// Ensure the stages of the pipeline in order
    async fn run_pipeline(
        &self,
        wordpress: &Wordpress,
        token: &CancellationToken,
    ) -> Result<PipelineProgress, ReconcileError> {
        for stage in self.pipeline.stages() {
            let mut observed = Vec::with_capacity(stage.kinds.len());

            for &kind in &stage.kinds {
                let desired = templates::desired(kind, stage.tier, wordpress);

                match ensure(self.store.as_ref(), wordpress, stage.tier, desired, token).await? {
                    EnsureResult::Created(key) => {
                        return Ok(PipelineProgress::Created {
                            tier: stage.tier,
                            kind,
                            key,
                        });
                    }
                    EnsureResult::Existing(resource) => observed.push(resource),
                }
            }

            if let Some(gate) = stage.gate {
                if !gate.is_open(&observed) {
                    return Ok(PipelineProgress::GateClosed { tier: stage.tier });
                }
                debug!(tier = %stage.tier, "stage gate open");
            }
        }

        Ok(PipelineProgress::Complete)
    }
}
