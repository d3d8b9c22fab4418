//! Metric records produced by collection routines.

/// Prometheus metric type of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    /// Get the TYPE comment string for Prometheus exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Static description of a metric family.
///
/// The label names are fixed per family, so every record emitted through a
/// descriptor carries the same label key set in the same order.
#[derive(Debug)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Describe a gauge family.
    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Gauge,
            labels,
        }
    }

    /// Describe a counter family.
    pub const fn counter(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Counter,
            labels,
        }
    }

    /// Emit one sample of this family.
    ///
    /// `values` are matched positionally against the descriptor's label names.
    pub fn emit(&'static self, value: f64, values: &[&str]) -> MetricRecord {
        debug_assert_eq!(
            values.len(),
            self.labels.len(),
            "label value count mismatch for {}",
            self.name
        );

        MetricRecord {
            name: self.name,
            help: self.help,
            kind: self.kind,
            value,
            labels: self
                .labels
                .iter()
                .zip(values)
                .map(|(key, value)| (*key, (*value).to_string()))
                .collect(),
        }
    }
}

/// One labeled sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    /// Full metric name, e.g. `fortigate_cpu_usage_ratio`.
    pub name: &'static str,
    /// Family help text.
    pub help: &'static str,
    /// Family type.
    pub kind: MetricKind,
    /// Sample value. NaN means the device reported no usable data.
    pub value: f64,
    /// Ordered label key-value pairs.
    pub labels: Vec<(&'static str, String)>,
}

impl MetricRecord {
    /// Look up a label value by key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of one collection routine.
///
/// `ok == false` marks a hard fetch or decode failure. `ok == true` with no
/// metrics means the routine does not apply to the target.
#[derive(Debug, Clone, Default)]
pub struct CollectionResult {
    pub metrics: Vec<MetricRecord>,
    pub ok: bool,
}

impl CollectionResult {
    /// Successful collection.
    pub fn collected(metrics: Vec<MetricRecord>) -> Self {
        Self { metrics, ok: true }
    }

    /// Routine not applicable to the target.
    pub fn skipped() -> Self {
        Self {
            metrics: Vec::new(),
            ok: true,
        }
    }

    /// Routine failed.
    pub fn failed() -> Self {
        Self {
            metrics: Vec::new(),
            ok: false,
        }
    }
}

/// Convert a boolean into a 0/1 gauge value.
pub fn bool_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}
