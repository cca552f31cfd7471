//! Prometheus metrics for store latency and student operations.
//!
//! This module provides:
//! - Store query latency per operation
//! - Student operation counters by outcome
//! - The Prometheus recorder backing `/metrics`

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Store query latency metric name.
pub const METRIC_STORE_QUERY_LATENCY: &str = "store_query_latency_ms";
/// Student operations counter metric name.
pub const METRIC_STUDENT_OPERATIONS: &str = "student_operations_total";

/// Install the global Prometheus recorder.
///
/// Can only succeed once per process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_STORE_QUERY_LATENCY,
        "Store statement latency in milliseconds"
    );
    describe_counter!(
        METRIC_STUDENT_OPERATIONS,
        "Student operations handled, labelled by operation and outcome"
    );

    debug!("Metrics initialized");
}

/// Count a handled student operation.
///
/// `outcome` is `ok` or a [`crate::error::StoreErrorKind`] / validation label.
pub fn record_operation(operation: &'static str, outcome: &str) {
    counter!(
        METRIC_STUDENT_OPERATIONS,
        "operation" => operation,
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Timer that records store latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    operation: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given store operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_STORE_QUERY_LATENCY, "operation" => self.operation).record(latency_ms);
    }
}

/// Create a latency timer for a store statement.
pub fn timer_store(operation: &'static str) -> LatencyTimer {
    LatencyTimer::new(operation)
}
