//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `wordpress_operator_reconciliations_total` - Total number of reconciliations
//! - `wordpress_operator_reconciliation_errors_total` - Total number of reconciliation errors
//! - `wordpress_operator_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `wordpress_operator_subresources_created_total` - Sub-resources created, by tier and kind
//! - `wordpress_operator_database_wait_requeues_total` - Passes stopped by the database gate
//! - `wordpress_operator_requeues_total` - Requeues, by reason

use crate::crd::Tier;
use crate::store::ManagedKind;
use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wordpress_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wordpress_operator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "wordpress_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SUBRESOURCES_CREATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "wordpress_operator_subresources_created_total",
            "Total number of sub-resources created",
        ),
        &["tier", "kind"],
    )
    .expect("Failed to create SUBRESOURCES_CREATED_TOTAL metric - this should never happen")
});

static DATABASE_WAIT_REQUEUES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "wordpress_operator_database_wait_requeues_total",
        "Total number of passes requeued while waiting for the database tier",
    )
    .expect("Failed to create DATABASE_WAIT_REQUEUES_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "wordpress_operator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SUBRESOURCES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DATABASE_WAIT_REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

/// Encode every registered metric in the Prometheus text format
pub fn gather_text() -> Result<Vec<u8>> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_subresources_created(tier: Tier, kind: ManagedKind) {
    SUBRESOURCES_CREATED_TOTAL
        .with_label_values(&[tier.short_name(), kind.as_str()])
        .inc();
}

pub fn increment_database_wait_requeues() {
    DATABASE_WAIT_REQUEUES_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // This should not panic - metrics should register successfully
        assert!(register_metrics().is_ok());
        let text = String::from_utf8(gather_text().unwrap()).unwrap();
        assert!(text.contains("wordpress_operator_reconciliations_total"));
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        let after = RECONCILIATIONS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        let after = RECONCILIATION_ERRORS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_subresources_created_by_label() {
        let counter = SUBRESOURCES_CREATED_TOTAL.with_label_values(&["wp", "Service"]);
        let before = counter.get();
        increment_subresources_created(Tier::Wordpress, ManagedKind::Service);
        assert_eq!(counter.get(), before + 1u64);
    }

    #[test]
    fn test_requeues_by_reason() {
        let counter = REQUEUES_TOTAL.with_label_values(&["error-backoff"]);
        let before = counter.get();
        increment_requeues_total("error-backoff");
        assert_eq!(counter.get(), before + 1u64);
    }
}
