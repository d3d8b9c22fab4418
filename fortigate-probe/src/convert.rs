//! Unit conversions applied to raw API values.
//!
//! FortiOS reports percentages as 0-100 and durations in milliseconds;
//! metrics are exported as ratios and seconds. Values the device could not
//! measure become NaN so that "no data" stays distinguishable from zero.

use serde_json::Value;

/// Smallest round-trip time the device reports, as `"<1"` milliseconds.
pub const MIN_RTT_SECONDS: f64 = 0.001;

/// Convert a 0-100 percentage into a 0-1 ratio.
pub fn percent_to_ratio(percent: f64) -> f64 {
    percent / 100.0
}

/// Convert milliseconds into seconds.
pub fn millis_to_seconds(millis: f64) -> f64 {
    millis / 1000.0
}

/// Convert megabits per second into bits per second.
pub fn mbps_to_bps(mbps: f64) -> f64 {
    mbps * 1_000_000.0
}

/// Parse a numeric string, mapping empty or malformed input to NaN.
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(raw, "Unparseable numeric value, exporting NaN");
            f64::NAN
        }
    }
}

/// Parse a round-trip time string in milliseconds into seconds.
///
/// `"<1"` maps to [`MIN_RTT_SECONDS`], empty or malformed input to NaN.
pub fn parse_rtt(raw: &str) -> f64 {
    if raw.trim() == "<1" {
        return MIN_RTT_SECONDS;
    }
    millis_to_seconds(parse_number(raw))
}

/// Round-trip time from a JSON value that may be a number or a string.
pub fn rtt_value(raw: &Value) -> f64 {
    match raw {
        Value::Number(n) => n.as_f64().map(millis_to_seconds).unwrap_or(f64::NAN),
        Value::String(s) => parse_rtt(s),
        Value::Null => f64::NAN,
        other => {
            tracing::debug!(raw = %other, "Unexpected round-trip time value, exporting NaN");
            f64::NAN
        }
    }
}

/// Optional measurement, NaN when absent.
pub fn or_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rtt() {
        assert_eq!(parse_rtt("<1"), 0.001);
        assert!(parse_rtt("").is_nan());
        assert_eq!(parse_rtt("357"), 0.357);
        assert!(parse_rtt("notanumber").is_nan());
    }

    #[test]
    fn test_rtt_value() {
        assert_eq!(rtt_value(&json!(12)), 0.012);
        assert_eq!(rtt_value(&json!("<1")), 0.001);
        assert!(rtt_value(&json!(null)).is_nan());
        assert!(rtt_value(&json!([1])).is_nan());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number(" 1.5 "), 1.5);
        assert!(parse_number("").is_nan());
        assert!(parse_number("n/a").is_nan());
    }

    #[test]
    fn test_scaling() {
        assert_eq!(percent_to_ratio(25.0), 0.25);
        assert_eq!(millis_to_seconds(1500.0), 1.5);
        assert_eq!(mbps_to_bps(1000.0), 1e9);
        assert!(or_nan(None).is_nan());
        assert_eq!(or_nan(Some(3.0)), 3.0);
    }
}
