//! Transpilation metrics for monitoring and observability.
//!
//! This module provides types for collecting and reporting metrics about
//! transpilation calls, including timing, input/output sizes and import
//! callbacks.

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collected for one transpilation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileMetrics {
    /// Duration in microseconds
    pub duration_us: u64,

    /// Source size in bytes
    pub source_bytes: u64,

    /// CSS size in bytes
    pub output_bytes: u64,

    /// Import callbacks served by the resolver
    pub import_calls: u64,

    /// Whether CSS was produced
    pub success: bool,
}

impl TranspileMetrics {
    /// Create new metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_us = duration.as_micros() as u64;
        self
    }

    /// Record input and output sizes
    pub fn with_sizes(mut self, source: usize, output: usize) -> Self {
        self.source_bytes = source as u64;
        self.output_bytes = output as u64;
        self
    }

    /// Record import callbacks
    pub fn with_import_calls(mut self, calls: u64) -> Self {
        self.import_calls = calls;
        self
    }

    /// Set the outcome
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }
}

/// Statistics for one transpiler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileStats {
    /// Total transpilations
    pub total_transpiles: u64,

    /// Transpilations that produced CSS
    pub successful_transpiles: u64,

    /// Transpilations that failed
    pub failed_transpiles: u64,

    /// Average duration in microseconds
    pub avg_duration_us: f64,

    /// Import callbacks served across all transpilations
    pub import_calls: u64,

    /// Resolvers currently registered process-wide
    pub registered_resolvers: usize,
}

/// Metrics collector for aggregating transpiler metrics
pub struct MetricsCollector {
    total_transpiles: AtomicU64,
    successful_transpiles: AtomicU64,
    failed_transpiles: AtomicU64,
    total_duration_us: AtomicU64,
    source_bytes: AtomicU64,
    output_bytes: AtomicU64,
    import_calls: AtomicU64,
    error_counts: parking_lot::Mutex<HashMap<ErrorCode, u64>>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            total_transpiles: AtomicU64::new(0),
            successful_transpiles: AtomicU64::new(0),
            failed_transpiles: AtomicU64::new(0),
            total_duration_us: AtomicU64::new(0),
            source_bytes: AtomicU64::new(0),
            output_bytes: AtomicU64::new(0),
            import_calls: AtomicU64::new(0),
            error_counts: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Record a transpilation
    pub fn record_transpile(&self, metrics: &TranspileMetrics) {
        self.total_transpiles.fetch_add(1, Ordering::Relaxed);

        if metrics.success {
            self.successful_transpiles.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_transpiles.fetch_add(1, Ordering::Relaxed);
        }

        self.total_duration_us
            .fetch_add(metrics.duration_us, Ordering::Relaxed);
        self.source_bytes
            .fetch_add(metrics.source_bytes, Ordering::Relaxed);
        self.output_bytes
            .fetch_add(metrics.output_bytes, Ordering::Relaxed);
        self.import_calls
            .fetch_add(metrics.import_calls, Ordering::Relaxed);
    }

    /// Record an error
    pub fn record_error(&self, code: ErrorCode) {
        *self.error_counts.lock().entry(code).or_insert(0) += 1;
    }

    /// Get total transpilations
    pub fn total_transpiles(&self) -> u64 {
        self.total_transpiles.load(Ordering::Relaxed)
    }

    /// Get successful transpilations
    pub fn successful_transpiles(&self) -> u64 {
        self.successful_transpiles.load(Ordering::Relaxed)
    }

    /// Get failed transpilations
    pub fn failed_transpiles(&self) -> u64 {
        self.failed_transpiles.load(Ordering::Relaxed)
    }

    /// Get import callbacks served
    pub fn import_calls(&self) -> u64 {
        self.import_calls.load(Ordering::Relaxed)
    }

    /// Get average duration in microseconds
    pub fn avg_duration_us(&self) -> f64 {
        let total = self.total_transpiles();
        if total == 0 {
            0.0
        } else {
            self.total_duration_us.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    /// Get error counts
    pub fn error_counts(&self) -> HashMap<ErrorCode, u64> {
        self.error_counts.lock().clone()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.total_transpiles.store(0, Ordering::Relaxed);
        self.successful_transpiles.store(0, Ordering::Relaxed);
        self.failed_transpiles.store(0, Ordering::Relaxed);
        self.total_duration_us.store(0, Ordering::Relaxed);
        self.source_bytes.store(0, Ordering::Relaxed);
        self.output_bytes.store(0, Ordering::Relaxed);
        self.import_calls.store(0, Ordering::Relaxed);
        self.error_counts.lock().clear();
    }

    /// Export Prometheus-format metrics
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP libsass_transpiles_total Total transpilations\n");
        output.push_str("# TYPE libsass_transpiles_total counter\n");
        output.push_str(&format!(
            "libsass_transpiles_total{{status=\"success\"}} {}\n",
            self.successful_transpiles()
        ));
        output.push_str(&format!(
            "libsass_transpiles_total{{status=\"error\"}} {}\n",
            self.failed_transpiles()
        ));

        output.push_str("\n# HELP libsass_transpile_time_us Average transpilation time\n");
        output.push_str("# TYPE libsass_transpile_time_us gauge\n");
        output.push_str(&format!(
            "libsass_transpile_time_us {:.2}\n",
            self.avg_duration_us()
        ));

        output.push_str("\n# HELP libsass_bytes_total Bytes processed\n");
        output.push_str("# TYPE libsass_bytes_total counter\n");
        output.push_str(&format!(
            "libsass_bytes_total{{direction=\"in\"}} {}\n",
            self.source_bytes.load(Ordering::Relaxed)
        ));
        output.push_str(&format!(
            "libsass_bytes_total{{direction=\"out\"}} {}\n",
            self.output_bytes.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP libsass_import_calls_total Import callbacks served\n");
        output.push_str("# TYPE libsass_import_calls_total counter\n");
        output.push_str(&format!(
            "libsass_import_calls_total {}\n",
            self.import_calls()
        ));

        // Errors
        output.push_str("\n# HELP libsass_errors_total Error counts by code\n");
        output.push_str("# TYPE libsass_errors_total counter\n");
        for (code, count) in self.error_counts() {
            output.push_str(&format!(
                "libsass_errors_total{{code=\"{}\"}} {}\n",
                code, count
            ));
        }

        output
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer for measuring a transpilation
pub struct TranspileTimer {
    start: Instant,
    source_bytes: usize,
}

impl TranspileTimer {
    /// Start a new timer for a source of `source_bytes` bytes
    pub fn start(source_bytes: usize) -> Self {
        Self {
            start: Instant::now(),
            source_bytes,
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Build metrics from timer
    pub fn into_metrics(
        self,
        output_bytes: usize,
        import_calls: u64,
        success: bool,
    ) -> TranspileMetrics {
        TranspileMetrics::new()
            .with_duration(self.elapsed())
            .with_sizes(self.source_bytes, output_bytes)
            .with_import_calls(import_calls)
            .with_success(success)
    }
}
