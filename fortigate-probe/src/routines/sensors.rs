//! Hardware sensors (temperature, fans, voltage).

use serde::Deserialize;

use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::scrape::ScrapeContext;

const SENSOR_INFO_PATH: &str = "monitor/system/sensor-info";

const ALARM_STATES: &[&str] = &["normal", "alarm"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sensor {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    value: Option<f64>,
    alarm: bool,
    thresholds: Option<Thresholds>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thresholds {
    lower_critical: Option<f64>,
    upper_critical: Option<f64>,
}

impl Sensor {
    fn alarm_state(&self) -> &'static str {
        if self.alarm { "alarm" } else { "normal" }
    }
}

static ALARM: MetricDesc = MetricDesc::gauge(
    "fortigate_sensor_alarm_status",
    "Alarm state of the hardware sensor",
    &["name", "type", "state"],
);
static VALUE: MetricDesc = MetricDesc::gauge(
    "fortigate_sensor_value",
    "Current sensor reading (celsius, rpm or volts)",
    &["name", "type"],
);
static LOWER_CRITICAL: MetricDesc = MetricDesc::gauge(
    "fortigate_sensor_lower_critical_threshold",
    "Lower critical threshold of the sensor",
    &["name", "type"],
);
static UPPER_CRITICAL: MetricDesc = MetricDesc::gauge(
    "fortigate_sensor_upper_critical_threshold",
    "Upper critical threshold of the sensor",
    &["name", "type"],
);

/// `system_sensor_info`: readings and alarm state per sensor.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let info: Envelope<Vec<Sensor>> = ctx.fetch_as(SENSOR_INFO_PATH, "")?;

    let mut out = Vec::new();
    for sensor in &info.results {
        let labels = [sensor.name.as_str(), sensor.kind.as_str()];
        emit_states(&ALARM, &labels, sensor.alarm_state(), ALARM_STATES, &mut out);

        // Sensors without a reading (absent fan modules) only report the alarm.
        let Some(value) = sensor.value else {
            continue;
        };
        out.push(VALUE.emit(value, &labels));

        if let Some(thresholds) = &sensor.thresholds {
            if let Some(lower) = thresholds.lower_critical {
                out.push(LOWER_CRITICAL.emit(lower, &labels));
            }
            if let Some(upper) = thresholds.upper_critical {
                out.push(UPPER_CRITICAL.emit(upper, &labels));
            }
        }
    }
    Ok(out)
}
