//! Managed FortiAP access points.

use serde::Deserialize;

use crate::convert::percent_to_ratio;
use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord, bool_value};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

const MANAGED_AP_PATH: &str = "monitor/wifi/managed_ap";

const JOIN_STATES: &[&str] = &["authorized", "unauthorized", "discovered", "disabled"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccessPoint {
    name: String,
    serial: String,
    /// Controller authorization state.
    state: String,
    /// Control channel state, `connected` when the AP is up.
    status: String,
    clients: f64,
    cpu_usage: Option<f64>,
    mem_free: Option<f64>,
    mem_total: Option<f64>,
    radio: Vec<Radio>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Radio {
    radio_id: u32,
    client_count: f64,
    channel_utilization_percent: Option<f64>,
    interfering_aps: f64,
    bandwidth_rx: f64,
    bandwidth_tx: f64,
}

const AP_LABELS: &[&str] = &["vdom", "ap_name", "serial"];
const RADIO_LABELS: &[&str] = &["vdom", "ap_name", "serial", "radio_id"];

static JOIN_STATE: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_access_point_join_state",
    "Authorization state of the access point on the controller",
    &["vdom", "ap_name", "serial", "state"],
);
static CONNECTED: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_access_point_connected",
    "Whether the access point control channel is connected",
    AP_LABELS,
);
static CLIENTS: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_access_point_clients",
    "Number of clients associated with the access point",
    AP_LABELS,
);
static CPU: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_access_point_cpu_usage_ratio",
    "CPU usage of the access point (0-1)",
    AP_LABELS,
);
static MEMORY_FREE: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_access_point_memory_free_bytes",
    "Free memory of the access point",
    AP_LABELS,
);
static MEMORY_TOTAL: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_access_point_memory_bytes",
    "Total memory of the access point",
    AP_LABELS,
);
static RADIO_CLIENTS: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_radio_clients",
    "Number of clients associated with the radio",
    RADIO_LABELS,
);
static RADIO_UTILIZATION: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_radio_channel_utilization_ratio",
    "Channel utilization seen by the radio (0-1)",
    RADIO_LABELS,
);
static RADIO_INTERFERING: MetricDesc = MetricDesc::gauge(
    "fortigate_wifi_radio_interfering_aps",
    "Number of interfering access points seen by the radio",
    RADIO_LABELS,
);
static RADIO_RX: MetricDesc = MetricDesc::counter(
    "fortigate_wifi_radio_receive_bytes_total",
    "Bytes received by the radio",
    RADIO_LABELS,
);
static RADIO_TX: MetricDesc = MetricDesc::counter(
    "fortigate_wifi_radio_transmit_bytes_total",
    "Bytes transmitted by the radio",
    RADIO_LABELS,
);

/// `wifi_managed_aps`: state and load per access point and radio.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Vec<AccessPoint>>> = ctx.fetch_as(MANAGED_AP_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for ap in &envelope.results {
            let labels = [envelope.vdom.as_str(), ap.name.as_str(), ap.serial.as_str()];
            emit_states(&JOIN_STATE, &labels, &ap.state, JOIN_STATES, &mut out);
            out.push(CONNECTED.emit(bool_value(ap.status == "connected"), &labels));
            out.push(CLIENTS.emit(ap.clients, &labels));
            if let Some(cpu) = ap.cpu_usage {
                out.push(CPU.emit(percent_to_ratio(cpu), &labels));
            }
            // Reported in KiB.
            if let Some(free) = ap.mem_free {
                out.push(MEMORY_FREE.emit(free * 1024.0, &labels));
            }
            if let Some(total) = ap.mem_total {
                out.push(MEMORY_TOTAL.emit(total * 1024.0, &labels));
            }

            for radio in &ap.radio {
                let radio_id = radio.radio_id.to_string();
                let labels = [
                    envelope.vdom.as_str(),
                    ap.name.as_str(),
                    ap.serial.as_str(),
                    radio_id.as_str(),
                ];
                out.push(RADIO_CLIENTS.emit(radio.client_count, &labels));
                if let Some(utilization) = radio.channel_utilization_percent {
                    out.push(RADIO_UTILIZATION.emit(percent_to_ratio(utilization), &labels));
                }
                out.push(RADIO_INTERFERING.emit(radio.interfering_aps, &labels));
                out.push(RADIO_RX.emit(radio.bandwidth_rx, &labels));
                out.push(RADIO_TX.emit(radio.bandwidth_tx, &labels));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticFetch;
    use crate::scrape::ProbeOptions;
    use serde_json::json;

    #[test]
    fn test_access_points_and_radios() {
        let fetch = StaticFetch::new().with(
            MANAGED_AP_PATH,
            VDOM_ALL,
            json!([{
                "vdom": "root",
                "results": [{
                    "name": "ap-lobby",
                    "serial": "FP231FTF20000001",
                    "state": "authorized",
                    "status": "connected",
                    "clients": 14,
                    "cpu_usage": 3,
                    "mem_free": 200000,
                    "mem_total": 500000,
                    "radio": [
                        {"radio_id": 1, "client_count": 4, "channel_utilization_percent": 25, "interfering_aps": 2},
                        {"radio_id": 2, "client_count": 10, "interfering_aps": 0}
                    ]
                }]
            }]),
        );
        let options = ProbeOptions::default();
        let ctx = ScrapeContext::new(&fetch, None, None, &options, tracing::Span::none());

        let metrics = collect(&ctx).unwrap();

        let connected = metrics
            .iter()
            .find(|m| m.name == "fortigate_wifi_access_point_connected")
            .unwrap();
        assert_eq!(connected.value, 1.0);

        let radios: Vec<(&str, f64)> = metrics
            .iter()
            .filter(|m| m.name == "fortigate_wifi_radio_clients")
            .map(|m| (m.label("radio_id").unwrap(), m.value))
            .collect();
        assert_eq!(radios, vec![("1", 4.0), ("2", 10.0)]);

        let utilization: Vec<f64> = metrics
            .iter()
            .filter(|m| m.name == "fortigate_wifi_radio_channel_utilization_ratio")
            .map(|m| m.value)
            .collect();
        assert_eq!(utilization, vec![0.25]);
    }
}
