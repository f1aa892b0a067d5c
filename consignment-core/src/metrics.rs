//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring contract invocations. Each [`Metrics`]
//! owns its registry, so several contracts (and tests) can coexist in one
//! process.
//!
//! # Metrics
//!
//! - `consignment_invocations_total{operation,outcome}` - Invocations by result
//! - `consignment_invoke_duration_seconds{operation}` - Invocation latency
//! - `consignment_containers_associated_total` - Containers bound to a cargo

use crate::{ErrorKind, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Invocations by operation and outcome
    pub invocations_total: IntCounterVec,

    /// Invocation duration histogram
    pub invoke_duration: HistogramVec,

    /// Containers associated with a cargo
    pub containers_associated: IntCounter,

    registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("containers_associated", &self.containers_associated.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let invocations_total = IntCounterVec::new(
            Opts::new(
                "consignment_invocations_total",
                "Total number of contract invocations",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(invocations_total.clone()))?;

        let invoke_duration = HistogramVec::new(
            HistogramOpts::new(
                "consignment_invoke_duration_seconds",
                "Histogram of invocation latencies",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(invoke_duration.clone()))?;

        let containers_associated = IntCounter::new(
            "consignment_containers_associated_total",
            "Total number of containers associated with a cargo",
        )?;
        registry.register(Box::new(containers_associated.clone()))?;

        Ok(Self {
            invocations_total,
            invoke_duration,
            containers_associated,
            registry,
        })
    }

    /// Record one finished invocation; `failure` is `None` on success
    pub fn record_invocation(
        &self,
        operation: &str,
        failure: Option<ErrorKind>,
        duration_seconds: f64,
    ) {
        let outcome = failure.map_or("success", |kind| kind.as_str());
        self.invocations_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.invoke_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Record containers bound to a new cargo
    pub fn record_containers_associated(&self, count: usize) {
        self.containers_associated.inc_by(count as u64);
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.containers_associated.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();

        a.record_containers_associated(3);
        assert_eq!(a.containers_associated.get(), 3);
        assert_eq!(b.containers_associated.get(), 0);
    }

    #[test]
    fn test_record_invocation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_invocation("addNewContainer", None, 0.002);
        metrics.record_invocation("addNewContainer", Some(ErrorKind::PreconditionFailed), 0.001);
        metrics.record_invocation("addNewContainer", None, 0.003);

        let ok = metrics
            .invocations_total
            .with_label_values(&["addNewContainer", "success"])
            .get();
        let failed = metrics
            .invocations_total
            .with_label_values(&["addNewContainer", "PreconditionFailed"])
            .get();
        assert_eq!((ok, failed), (2, 1));
    }

    #[test]
    fn test_render() {
        let metrics = Metrics::new().unwrap();
        metrics.record_invocation("traceCargo", None, 0.001);

        let text = metrics.render().unwrap();
        assert!(text.contains("consignment_invocations_total"));
        assert!(text.contains("operation=\"traceCargo\""));
    }
}
