//! Transaction metrics
//!
//! Commits report through [`TxnMetricsSink`], so the accessor has no
//! process-wide metric state of its own. [`TxnMetrics`] is the Prometheus
//! implementation, registered on a caller-provided registry.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
    exponential_buckets,
};

pub const OUTCOME_LABEL: &str = "outcome";
pub const OUTCOME_SUCCESS: &str = "success";
pub const OUTCOME_FAILED: &str = "failed";

/// Receives the outcome and latency of every transaction commit.
pub trait TxnMetricsSink: Send + Sync {
    fn increment_outcome(&self, outcome: &str);

    fn observe_duration(&self, outcome: &str, seconds: f64);
}

/// Prometheus-backed commit metrics.
#[derive(Clone)]
pub struct TxnMetrics {
    /// Commits by outcome
    pub txn_counter: IntCounterVec,

    /// Commit latency by outcome
    pub txn_duration: HistogramVec,
}

impl TxnMetrics {
    /// Create the metrics and register them on `registry`.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let txn_counter = IntCounterVec::new(
            Opts::new("handle_txns_total", "Counter of txns handled.")
                .namespace("pd")
                .subsystem("txn"),
            &[OUTCOME_LABEL],
        )?;

        let txn_duration = HistogramVec::new(
            HistogramOpts::new(
                "handle_txns_duration_seconds",
                "Bucketed histogram of processing time (s) of handled txns.",
            )
            .namespace("pd")
            .subsystem("txn")
            .buckets(exponential_buckets(0.0005, 2.0, 13)?),
            &[OUTCOME_LABEL],
        )?;

        registry.register(Box::new(txn_counter.clone()))?;
        registry.register(Box::new(txn_duration.clone()))?;

        Ok(Self {
            txn_counter,
            txn_duration,
        })
    }

    /// Commits recorded with the given outcome.
    pub fn count(&self, outcome: &str) -> u64 {
        self.txn_counter.with_label_values(&[outcome]).get()
    }
}

impl TxnMetricsSink for TxnMetrics {
    fn increment_outcome(&self, outcome: &str) {
        self.txn_counter.with_label_values(&[outcome]).inc();
    }

    fn observe_duration(&self, outcome: &str, seconds: f64) {
        self.txn_duration
            .with_label_values(&[outcome])
            .observe(seconds);
    }
}

/// Sink that drops every observation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl TxnMetricsSink for NoopMetrics {
    fn increment_outcome(&self, _outcome: &str) {}

    fn observe_duration(&self, _outcome: &str, _seconds: f64) {}
}

/// Render a registry in the Prometheus text format.
pub fn gather(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    encoder.encode_to_string(&registry.gather())
}
