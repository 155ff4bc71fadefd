//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Store Metrics
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("friendsync_store_operations_total", "Total number of record store operations"),
        &["operation", "table", "status"]
    ).expect("metric can be created");
    pub static ref STORE_OPERATION_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "friendsync_store_operation_duration_seconds",
            "Record store operation duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref SKIPPED_RECORDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("friendsync_skipped_records_total", "Total number of malformed records skipped during scans"),
        &["table"]
    ).expect("metric can be created");

    // Pipeline Metrics
    pub static ref REFRESHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("friendsync_refreshes_total", "Total number of directory refreshes"),
        &["pipeline", "status"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_SIZE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("friendsync_session_cache_size", "Current number of users in a session cache list"),
        &["session", "list"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("friendsync_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(STORE_OPERATIONS_TOTAL.clone()))
        .expect("STORE_OPERATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STORE_OPERATION_DURATION_SECONDS.clone()))
        .expect("STORE_OPERATION_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(SKIPPED_RECORDS_TOTAL.clone()))
        .expect("SKIPPED_RECORDS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(REFRESHES_TOTAL.clone()))
        .expect("REFRESHES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_SIZE.clone()))
        .expect("CACHE_SIZE can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record one store call with its outcome and latency.
pub fn observe_store_operation(operation: &str, table: &str, status: &str, elapsed: Duration) {
    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, table, status])
        .inc();
    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(elapsed.as_secs_f64());
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_text() -> String {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(error) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(%error, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
