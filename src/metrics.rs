//! Engine telemetry
//!
//! Counters and histograms recorded through the `metrics` facade. Nothing is
//! exported unless a recorder is installed, so recording is free in tests and
//! in the default build.
//!
//! # Metrics
//!
//! - `model_calls_total`: Counter of admitted model calls by operation
//! - `model_call_duration_seconds`: Histogram of provider round-trip time
//! - `model_call_errors_total`: Counter of failed provider calls by kind
//! - `model_calls_active`: Gauge of provider calls in flight
//! - `model_cache_lookups_total`: Counter of cache lookups by result
//! - `model_rate_limit_denials_total`: Counter of calls refused by the limiter
//! - `model_parse_total`: Counter of parsed replies by tier
//! - `playlist_generations_total`: Counter of generation cycles by outcome
//! - `feedback_flushes_total`: Counter of feedback batch flushes by outcome
//!
//! # Examples
//!
//! ```
//! use vinylvibe::metrics::ModelCallMetrics;
//!
//! let metrics = ModelCallMetrics::new("interpret_seed");
//! metrics.record_success();
//! ```

use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Timing and outcome tracking for one provider round trip
///
/// Created immediately before the network call. Dropping it without
/// recording still balances the in-flight gauge, which covers cancelled
/// futures.
#[derive(Debug)]
pub struct ModelCallMetrics {
    operation: String,
    start: Instant,
    recorded: AtomicBool,
}

impl ModelCallMetrics {
    /// Start tracking a provider call for `operation`
    pub fn new(operation: &str) -> Self {
        increment_counter!("model_calls_total", "operation" => operation.to_string());
        increment_gauge!("model_calls_active", 1.0);

        Self {
            operation: operation.to_string(),
            start: Instant::now(),
            recorded: AtomicBool::new(false),
        }
    }

    /// Record a completed round trip
    pub fn record_success(&self) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }
        histogram!(
            "model_call_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "operation" => self.operation.clone()
        );
        decrement_gauge!("model_calls_active", 1.0);
    }

    /// Record a failed round trip
    ///
    /// # Arguments
    ///
    /// * `kind` - Short failure label such as `"transport"`
    pub fn record_error(&self, kind: &str) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }
        increment_counter!(
            "model_call_errors_total",
            "operation" => self.operation.clone(),
            "kind" => kind.to_string()
        );
        decrement_gauge!("model_calls_active", 1.0);
    }

    /// Operation label this tracker reports under
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Drop for ModelCallMetrics {
    fn drop(&mut self) {
        if !self.recorded.load(Ordering::SeqCst) {
            decrement_gauge!("model_calls_active", 1.0);
        }
    }
}

/// Count a response cache lookup
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    increment_counter!("model_cache_lookups_total", "result" => result);
}

/// Count a call refused by the rate limiter
pub fn record_rate_limit_denial() {
    increment_counter!("model_rate_limit_denials_total");
}

/// Count a reply by the parse tier that accepted it
///
/// `tier` is one of `"json"`, `"embedded"`, `"pattern"` or `"unparsed"`.
pub fn record_parse(tier: &'static str) {
    increment_counter!("model_parse_total", "tier" => tier);
}

/// Count a finished generation cycle
pub fn record_generation(outcome: &'static str) {
    increment_counter!("playlist_generations_total", "outcome" => outcome);
}

/// Count a feedback batch flush
pub fn record_feedback_flush(outcome: &'static str) {
    increment_counter!("feedback_flushes_total", "outcome" => outcome);
}

/// Initializes the metrics exporter for Prometheus
///
/// When the `prometheus` feature is enabled this installs the Prometheus
/// exporter on its default listener. Otherwise it is a no-op.
///
/// # Examples
///
/// ```
/// use vinylvibe::metrics::init_metrics_exporter;
///
/// init_metrics_exporter();
/// ```
pub fn init_metrics_exporter() {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let _ = builder.install().map_err(|e| {
            tracing::warn!("Failed to install Prometheus exporter: {}", e);
        });
    }
}
