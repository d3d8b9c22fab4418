//! Categorical state strings to mutually exclusive 0/1 indicators.

use crate::metric::{MetricDesc, MetricRecord};

/// Reserved indicator for values outside the known state list.
pub const UNKNOWN_STATE: &str = "unknown";

/// Map `status` onto one indicator per known state.
///
/// Output follows the order of `known_states`, followed by [`UNKNOWN_STATE`]
/// when the list does not already contain it. Exactly one indicator is 1:
/// the matching state, or [`UNKNOWN_STATE`] when nothing matched. Matching is
/// exact.
pub fn fan_out<'a>(status: &str, known_states: &[&'a str]) -> Vec<(&'a str, f64)> {
    let matched = known_states.iter().any(|state| *state == status);
    let mut indicators: Vec<(&'a str, f64)> = known_states
        .iter()
        .map(|state| {
            let hit = if matched {
                *state == status
            } else {
                *state == UNKNOWN_STATE
            };
            (*state, if hit { 1.0 } else { 0.0 })
        })
        .collect();

    if !known_states.iter().any(|state| *state == UNKNOWN_STATE) {
        indicators.push((UNKNOWN_STATE, if matched { 0.0 } else { 1.0 }));
    }

    indicators
}

/// Emit one record per indicator of `status`.
///
/// `desc` must end with a `state` label; `label_values` covers the others.
pub fn emit_states(
    desc: &'static MetricDesc,
    label_values: &[&str],
    status: &str,
    known_states: &[&str],
    out: &mut Vec<MetricRecord>,
) {
    debug_assert_eq!(desc.labels.last(), Some(&"state"));

    let mut values: Vec<&str> = Vec::with_capacity(label_values.len() + 1);
    values.extend_from_slice(label_values);
    values.push("");

    for (state, value) in fan_out(status, known_states) {
        if let Some(last) = values.last_mut() {
            *last = state;
        }
        out.push(desc.emit(value, &values));
    }
}
