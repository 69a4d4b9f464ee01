//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `xds_snapshot_reconciliations_total` - Total number of reconciliations
//! - `xds_snapshot_reconciliation_errors_total` - Reconciliation errors by class and reason
//! - `xds_snapshot_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `xds_snapshot_snapshots_published_total` - Snapshots written to the store
//! - `xds_snapshot_snapshots_skipped_total` - Passes that found the published snapshot current
//! - `xds_snapshot_published_resources` - Resources in the last published snapshot, by kind
//! - `xds_snapshot_requeues_total` - Requeues scheduled by the error policy, by reason

use crate::envoy::ResourceKind;
use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGaugeVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "xds_snapshot_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "xds_snapshot_reconciliation_errors_total",
            "Total number of reconciliation errors by class and reason",
        ),
        &["class", "reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "xds_snapshot_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SNAPSHOTS_PUBLISHED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "xds_snapshot_snapshots_published_total",
        "Total number of snapshots published to the snapshot store",
    )
    .expect("Failed to create SNAPSHOTS_PUBLISHED_TOTAL metric - this should never happen")
});

static SNAPSHOTS_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "xds_snapshot_snapshots_skipped_total",
        "Total number of reconciliations that found the published snapshot unchanged",
    )
    .expect("Failed to create SNAPSHOTS_SKIPPED_TOTAL metric - this should never happen")
});

static PUBLISHED_RESOURCES: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "xds_snapshot_published_resources",
            "Number of resources in the most recently published snapshot by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create PUBLISHED_RESOURCES metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "xds_snapshot_requeues_total",
            "Total number of requeues scheduled by the error policy",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SNAPSHOTS_PUBLISHED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SNAPSHOTS_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PUBLISHED_RESOURCES.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(class: &str, reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[class, reason])
        .inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_snapshots_published() {
    SNAPSHOTS_PUBLISHED_TOTAL.inc();
}

pub fn increment_snapshots_skipped() {
    SNAPSHOTS_SKIPPED_TOTAL.inc();
}

pub fn set_published_resources(kind: ResourceKind, count: usize) {
    PUBLISHED_RESOURCES
        .with_label_values(&[kind.spec_field()])
        .set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
