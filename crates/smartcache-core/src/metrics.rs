//! Metrics collection for SmartCache
//!
//! TigerStyle: Explicit metric names with units, type-safe recording.
//!
//! Recording functions are no-ops unless the `otel` feature is enabled, in
//! which case they feed OpenTelemetry instruments on the global meter.

#[cfg(feature = "otel")]
use crate::constants::*;
#[cfg(feature = "otel")]
use once_cell::sync::Lazy;
#[cfg(feature = "otel")]
use opentelemetry::metrics::{Counter, Histogram};
#[cfg(feature = "otel")]
use opentelemetry::{global, KeyValue};

#[cfg(feature = "otel")]
static ACTORS_ACTIVATED_COUNTER: Lazy<Counter<u64>> = Lazy::new(|| {
    global::meter("smartcache")
        .u64_counter(METRIC_NAME_ACTORS_ACTIVATED_TOTAL)
        .with_description("Total number of actor activations")
        .init()
});

#[cfg(feature = "otel")]
static ACTORS_DEACTIVATED_COUNTER: Lazy<Counter<u64>> = Lazy::new(|| {
    global::meter("smartcache")
        .u64_counter(METRIC_NAME_ACTORS_DEACTIVATED_TOTAL)
        .with_description("Total number of actor deactivations")
        .init()
});

#[cfg(feature = "otel")]
static OPERATIONS_COUNTER: Lazy<Counter<u64>> = Lazy::new(|| {
    global::meter("smartcache")
        .u64_counter(METRIC_NAME_OPERATIONS_TOTAL)
        .with_description("Total number of key operations")
        .init()
});

#[cfg(feature = "otel")]
static OPERATION_DURATION_HISTOGRAM: Lazy<Histogram<f64>> = Lazy::new(|| {
    global::meter("smartcache")
        .f64_histogram(METRIC_NAME_OPERATION_DURATION_SECONDS)
        .with_description("Key operation duration in seconds")
        .init()
});

#[cfg(feature = "otel")]
static STORE_OPERATIONS_COUNTER: Lazy<Counter<u64>> = Lazy::new(|| {
    global::meter("smartcache")
        .u64_counter(METRIC_NAME_STORE_OPERATIONS_TOTAL)
        .with_description("Total durable store operations")
        .init()
});

#[cfg(feature = "otel")]
static STORE_DURATION_HISTOGRAM: Lazy<Histogram<f64>> = Lazy::new(|| {
    global::meter("smartcache")
        .f64_histogram(METRIC_NAME_STORE_DURATION_SECONDS)
        .with_description("Durable store operation duration in seconds")
        .init()
});

/// Record actor activation
#[cfg(feature = "otel")]
pub fn record_actor_activated() {
    ACTORS_ACTIVATED_COUNTER.add(1, &[]);
}

/// Record actor deactivation
#[cfg(feature = "otel")]
pub fn record_actor_deactivated() {
    ACTORS_DEACTIVATED_COUNTER.add(1, &[]);
}

/// Record a key operation
///
/// # Arguments
/// * `operation` - "is_breached", "add" or "remove"
/// * `status` - "success" or "error"
/// * `duration_seconds` - Duration in seconds
#[cfg(feature = "otel")]
pub fn record_operation(operation: &str, status: &str, duration_seconds: f64) {
    OPERATIONS_COUNTER.add(
        1,
        &[
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("status", status.to_string()),
        ],
    );

    OPERATION_DURATION_HISTOGRAM.record(
        duration_seconds,
        &[KeyValue::new("operation", operation.to_string())],
    );
}

/// Record a durable store call
///
/// # Arguments
/// * `operation` - "read", "write" or "clear"
/// * `status` - "success", "error" or "timeout"
/// * `duration_seconds` - Duration in seconds
#[cfg(feature = "otel")]
pub fn record_store_operation(operation: &str, status: &str, duration_seconds: f64) {
    STORE_OPERATIONS_COUNTER.add(
        1,
        &[
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("status", status.to_string()),
        ],
    );

    STORE_DURATION_HISTOGRAM.record(
        duration_seconds,
        &[KeyValue::new("operation", operation.to_string())],
    );
}

// No-op implementations when otel feature is disabled
#[cfg(not(feature = "otel"))]
pub fn record_actor_activated() {}

#[cfg(not(feature = "otel"))]
pub fn record_actor_deactivated() {}

#[cfg(not(feature = "otel"))]
pub fn record_operation(_operation: &str, _status: &str, _duration_seconds: f64) {}

#[cfg(not(feature = "otel"))]
pub fn record_store_operation(_operation: &str, _status: &str, _duration_seconds: f64) {}
