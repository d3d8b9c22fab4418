//! Prometheus text exposition of probe results.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::time::Duration;

use fortigate_probe::{MetricKind, MetricRecord};

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render probe metrics followed by `probe_success` and
/// `probe_duration_seconds`.
///
/// Families appear in the order they were first emitted, each with its
/// `# HELP` and `# TYPE` lines once. A series repeating the label values of
/// an earlier one is dropped.
pub fn render(metrics: &[MetricRecord], success: bool, duration: Duration) -> String {
    let mut families: Vec<(&MetricRecord, Vec<&MetricRecord>)> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for metric in metrics {
        match by_name.get(metric.name) {
            Some(&index) => families[index].1.push(metric),
            None => {
                by_name.insert(metric.name, families.len());
                families.push((metric, vec![metric]));
            }
        }
    }

    let mut output = String::with_capacity(metrics.len() * 100);
    for (head, series) in &families {
        writeln!(output, "# HELP {} {}", head.name, escape_help(head.help)).ok();
        writeln!(output, "# TYPE {} {}", head.name, head.kind.as_str()).ok();

        let mut seen: HashSet<String> = HashSet::with_capacity(series.len());
        for metric in series {
            let labels = format_labels(&metric.labels);
            if !seen.insert(labels.clone()) {
                tracing::warn!(
                    metric = metric.name,
                    labels = %labels,
                    "Duplicate series dropped"
                );
                continue;
            }
            writeln!(output, "{}{} {}", metric.name, labels, format_value(metric.value)).ok();
        }
    }

    write_gauge(
        &mut output,
        "probe_success",
        "Whether every collection routine succeeded",
        if success { 1.0 } else { 0.0 },
    );
    write_gauge(
        &mut output,
        "probe_duration_seconds",
        "How long the probe took to complete in seconds",
        duration.as_secs_f64(),
    );

    output
}

fn write_gauge(output: &mut String, name: &str, help: &str, value: f64) {
    writeln!(output, "# HELP {} {}", name, help).ok();
    writeln!(output, "# TYPE {} {}", name, MetricKind::Gauge.as_str()).ok();
    writeln!(output, "{} {}", name, format_value(value)).ok();
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape special characters in help text.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for Prometheus exposition format.
fn format_labels(labels: &[(&'static str, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortigate_probe::MetricDesc;

    static SESSIONS: MetricDesc = MetricDesc::gauge(
        "fortigate_current_sessions",
        "Number of active sessions",
        &["protocol"],
    );
    static BYTES: MetricDesc = MetricDesc::counter(
        "fortigate_interface_receive_bytes_total",
        "Number of bytes received on the interface",
        &["name"],
    );

    #[test]
    fn test_render_groups_families_in_emission_order() {
        let metrics = vec![
            SESSIONS.emit(10.0, &["ipv4"]),
            BYTES.emit(1500.0, &["wan1"]),
            SESSIONS.emit(2.0, &["ipv6"]),
        ];

        let output = render(&metrics, true, Duration::from_millis(250));

        let expected = "\
# HELP fortigate_current_sessions Number of active sessions
# TYPE fortigate_current_sessions gauge
fortigate_current_sessions{protocol=\"ipv4\"} 10
fortigate_current_sessions{protocol=\"ipv6\"} 2
# HELP fortigate_interface_receive_bytes_total Number of bytes received on the interface
# TYPE fortigate_interface_receive_bytes_total counter
fortigate_interface_receive_bytes_total{name=\"wan1\"} 1500
# HELP probe_success Whether every collection routine succeeded
# TYPE probe_success gauge
probe_success 1
# HELP probe_duration_seconds How long the probe took to complete in seconds
# TYPE probe_duration_seconds gauge
probe_duration_seconds 0.25
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_render_drops_duplicate_series() {
        let metrics = vec![SESSIONS.emit(1.0, &["ipv4"]), SESSIONS.emit(2.0, &["ipv4"])];

        let output = render(&metrics, false, Duration::ZERO);

        assert!(output.contains("fortigate_current_sessions{protocol=\"ipv4\"} 1\n"));
        assert!(!output.contains("fortigate_current_sessions{protocol=\"ipv4\"} 2\n"));
        assert!(output.contains("probe_success 0\n"));
    }

    #[test]
    fn test_render_nan() {
        let metrics = vec![SESSIONS.emit(f64::NAN, &["ipv4"])];

        let output = render(&metrics, true, Duration::ZERO);

        assert!(output.contains("fortigate_current_sessions{protocol=\"ipv4\"} NaN\n"));
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("simple"), "simple");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(0.001), "0.001");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }
}
