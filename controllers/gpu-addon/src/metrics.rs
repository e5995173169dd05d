//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `gpu_addon_reconciliations_total` - Total number of reconcile passes
//! - `gpu_addon_reconciliation_errors_total` - Total number of failed reconcile passes
//! - `gpu_addon_reconciliation_duration_seconds` - Duration of reconcile passes
//! - `gpu_addon_teardowns_total` - Total number of add-on teardowns
//! - `gpu_addon_network_operator_subscription_installed` - 1 when the network
//!   operator subscription reports an installed CSV

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntGaugeVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("gpu_addon_reconciliations_total", "Total number of reconcile passes")
        .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gpu_addon_reconciliation_errors_total",
        "Total number of failed reconcile passes",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gpu_addon_reconciliation_duration_seconds",
            "Duration of reconcile passes in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static TEARDOWNS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("gpu_addon_teardowns_total", "Total number of add-on teardowns")
        .expect("Failed to create TEARDOWNS_TOTAL metric - this should never happen")
});

static NETWORK_OPERATOR_SUBSCRIPTION_INSTALLED: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "gpu_addon_network_operator_subscription_installed",
            "Whether the network operator subscription has an installed CSV",
        ),
        &["current_csv", "installed_csv"],
    )
    .expect(
        "Failed to create NETWORK_OPERATOR_SUBSCRIPTION_INSTALLED metric - this should never happen",
    )
});

/// Register all metrics with the registry
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(TEARDOWNS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(NETWORK_OPERATOR_SUBSCRIPTION_INSTALLED.clone()))?;
    Ok(())
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

pub fn increment_teardowns() {
    TEARDOWNS_TOTAL.inc();
}

/// Record the subscription's CSV state; the previous series is replaced
pub fn set_network_operator_subscription(current_csv: &str, installed_csv: &str) {
    NETWORK_OPERATOR_SUBSCRIPTION_INSTALLED.reset();
    let installed = i64::from(!installed_csv.is_empty());
    NETWORK_OPERATOR_SUBSCRIPTION_INSTALLED
        .with_label_values(&[current_csv, installed_csv])
        .set(installed);
}

pub fn clear_network_operator_subscription() {
    NETWORK_OPERATOR_SUBSCRIPTION_INSTALLED.reset();
}

