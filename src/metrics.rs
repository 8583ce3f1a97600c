// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the catalog operator.
//!
//! Everything is registered in [`METRICS_REGISTRY`] under the `catalogsync_` prefix
//! and served on `/metrics`.
//!
//! | Metric                                          | Labels                         |
//! |-------------------------------------------------|--------------------------------|
//! | `catalogsync_broker_reconciles_total`           | `outcome`                      |
//! | `catalogsync_broker_reconcile_duration_seconds` | `outcome`                      |
//! | `catalogsync_broker_requeues_total`             | `reason`                       |
//! | `catalogsync_broker_errors_total`               | `class`                        |
//! | `catalogsync_catalog_objects_written_total`     | `kind`, `action`               |
//! | `catalogsync_catalog_fetch_duration_seconds`    | `result`                       |
//! | `catalogsync_catalog_entries`                   | `namespace`, `broker`, `entry` |
//!
//! # Example
//!
//! ```rust,no_run
//! use catalogsync::metrics::{record_reconcile, ReconcileResult};
//!
//! record_reconcile(ReconcileResult::Synced, std::time::Duration::from_secs(1));
//! ```

use prometheus::core::Collector;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

const PREFIX: &str = "catalogsync";

/// Registry served by the metrics endpoint
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// How a single broker reconcile ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileResult {
    /// Catalog applied
    Synced,
    /// Nothing failed but the broker was requeued early
    Waiting,
    /// Reconcile returned an error
    Failed,
}

impl ReconcileResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReconcileResult::Synced => "synced",
            ReconcileResult::Waiting => "waiting",
            ReconcileResult::Failed => "failed",
        }
    }
}

fn register<M>(metric: M) -> M
where
    M: Collector + Clone + 'static,
{
    // Names are static and registered once, so this only fails on a programming error
    METRICS_REGISTRY.register(Box::new(metric.clone())).unwrap();
    metric
}

fn counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    register(CounterVec::new(Opts::new(format!("{PREFIX}_{name}"), help), labels).unwrap())
}

fn histogram(name: &str, help: &str, labels: &[&str], buckets: Vec<f64>) -> HistogramVec {
    let opts = HistogramOpts::new(format!("{PREFIX}_{name}"), help).buckets(buckets);
    register(HistogramVec::new(opts, labels).unwrap())
}

pub static BROKER_RECONCILES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter(
        "broker_reconciles_total",
        "ServiceBroker reconciles by outcome",
        &["outcome"],
    )
});

pub static BROKER_RECONCILE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    histogram(
        "broker_reconcile_duration_seconds",
        "Wall time of ServiceBroker reconciles, including catalog fetch",
        &["outcome"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
    )
});

/// Labels: `reason` is `secret_not_available` or an [`crate::errors::ErrorClass`] label.
pub static BROKER_REQUEUES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter(
        "broker_requeues_total",
        "ServiceBroker requeues by reason",
        &["reason"],
    )
});

pub static BROKER_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter(
        "broker_errors_total",
        "ServiceBroker reconcile errors by error class",
        &["class"],
    )
});

/// Labels: `kind` is `ServiceOffering` or `ServicePlan`, `action` is `created` or `updated`.
pub static CATALOG_OBJECTS_WRITTEN_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter(
        "catalog_objects_written_total",
        "Offerings and plans written while applying broker catalogs",
        &["kind", "action"],
    )
});

pub static CATALOG_FETCH_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    histogram(
        "catalog_fetch_duration_seconds",
        "Broker catalog fetches including retries, by result",
        &["result"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0],
    )
});

pub static CATALOG_ENTRIES: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{PREFIX}_catalog_entries"),
        "Services and plans in the last catalog fetched from each broker",
    );
    register(GaugeVec::new(opts, &["namespace", "broker", "entry"]).unwrap())
});

/// Count one broker reconcile and its duration.
pub fn record_reconcile(result: ReconcileResult, duration: Duration) {
    let outcome = result.as_str();
    BROKER_RECONCILES_TOTAL.with_label_values(&[outcome]).inc();
    BROKER_RECONCILE_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

pub fn record_requeue(reason: &str) {
    BROKER_REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_error(class: &str) {
    BROKER_ERRORS_TOTAL.with_label_values(&[class]).inc();
}

/// Count an offering or plan create (`created`) or replace (`updated`).
pub fn record_object_written(kind: &str, action: &str) {
    CATALOG_OBJECTS_WRITTEN_TOTAL
        .with_label_values(&[kind, action])
        .inc();
}

pub fn record_catalog_fetch(result: &str, duration: Duration) {
    CATALOG_FETCH_DURATION_SECONDS
        .with_label_values(&[result])
        .observe(duration.as_secs_f64());
}

#[allow(clippy::cast_precision_loss)]
pub fn record_catalog_size(namespace: &str, broker: &str, services: usize, plans: usize) {
    CATALOG_ENTRIES
        .with_label_values(&[namespace, broker, "services"])
        .set(services as f64);
    CATALOG_ENTRIES
        .with_label_values(&[namespace, broker, "plans"])
        .set(plans as f64);
}

/// Drop the per-broker series of a deleted broker.
pub fn forget_broker(namespace: &str, broker: &str) {
    for entry in ["services", "plans"] {
        // Absent when the broker never got as far as fetching a catalog
        let _ = CATALOG_ENTRIES.remove_label_values(&[namespace, broker, entry]);
    }
}

/// Encode the registry in the Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&METRICS_REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
