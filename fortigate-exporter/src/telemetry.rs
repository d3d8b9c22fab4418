//! Exporter self-monitoring.
//!
//! Served on the metrics path, separate from probe results.

use std::sync::Arc;
use std::sync::atomic::AtomicI64;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// How a probe ended.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum ProbeOutcome {
    Success,
    Failure,
    Timeout,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct OutcomeLabels {
    outcome: ProbeOutcome,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RoutineLabels {
    routine: String,
}

/// Counters and histograms describing the exporter itself.
#[derive(Debug)]
pub struct ExporterMetrics {
    registry: Registry,
    probes: Family<OutcomeLabels, Counter>,
    probe_duration: Histogram,
    routine_failures: Family<RoutineLabels, Counter>,
    probes_in_flight: Gauge<i64, AtomicI64>,
}

/// Shareable handle.
pub type SharedMetrics = Arc<ExporterMetrics>;

impl ExporterMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("fortigate_exporter");

        let probes = Family::<OutcomeLabels, Counter>::default();
        registry.register("probes", "Probes run, by outcome", probes.clone());

        let probe_duration = Histogram::new(exponential_buckets(0.25, 2.0, 8));
        registry.register(
            "probe_duration_seconds",
            "Time spent probing a target",
            probe_duration.clone(),
        );

        let routine_failures = Family::<RoutineLabels, Counter>::default();
        registry.register(
            "routine_failures",
            "Collection routines that failed, by routine",
            routine_failures.clone(),
        );

        let probes_in_flight = Gauge::<i64, AtomicI64>::default();
        registry.register(
            "probes_in_flight",
            "Probes currently running",
            probes_in_flight.clone(),
        );

        Self {
            registry,
            probes,
            probe_duration,
            routine_failures,
            probes_in_flight,
        }
    }

    /// Record a finished probe.
    pub fn observe_probe(&self, outcome: ProbeOutcome, seconds: f64) {
        self.probes.get_or_create(&OutcomeLabels { outcome }).inc();
        self.probe_duration.observe(seconds);
    }

    /// Record a failed collection routine.
    pub fn routine_failed(&self, routine: &str) {
        self.routine_failures
            .get_or_create(&RoutineLabels {
                routine: routine.to_string(),
            })
            .inc();
    }

    /// Mark a probe as started until the guard is dropped.
    pub fn start_probe(&self) -> InFlightGuard<'_> {
        self.probes_in_flight.inc();
        InFlightGuard { metrics: self }
    }

    /// Encode every metric in the text exposition format.
    pub fn render(&self) -> String {
        let mut output = String::new();
        if let Err(e) = encode(&mut output, &self.registry) {
            tracing::error!(error = %e, "Failed to encode exporter metrics");
        }
        output
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight gauge on drop.
pub struct InFlightGuard<'a> {
    metrics: &'a ExporterMetrics,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.probes_in_flight.dec();
    }
}
