use std::collections::BTreeMap;

use serde::Deserialize;

use crate::convert::mbps_to_bps;
use crate::error::Result;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord, bool_value};
use crate::scrape::ScrapeContext;

const INTERFACE_PATH: &str = "monitor/system/interface/select";
const INTERFACE_QUERY: &str = "vdom=*&include_vlan=true&include_aggregate=true";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Interface {
    alias: String,
    link: bool,
    /// Mbit/s.
    speed: f64,
    tx_packets: f64,
    rx_packets: f64,
    tx_bytes: f64,
    rx_bytes: f64,
    tx_errors: f64,
    rx_errors: f64,
    /// Parent interface of VLANs and aggregate members.
    interface: String,
}

const LABELS: &[&str] = &["vdom", "name", "alias", "parent"];

static LINK_UP: MetricDesc = MetricDesc::gauge(
    "fortigate_interface_link_up",
    "Whether the link is up or not (1 = up)",
    LABELS,
);
static SPEED: MetricDesc = MetricDesc::gauge(
    "fortigate_interface_speed_bps",
    "Speed negotiated on the interface in bits/s",
    LABELS,
);
static TX_PACKETS: MetricDesc = MetricDesc::counter(
    "fortigate_interface_transmit_packets_total",
    "Number of packets transmitted on the interface",
    LABELS,
);
static RX_PACKETS: MetricDesc = MetricDesc::counter(
    "fortigate_interface_receive_packets_total",
    "Number of packets received on the interface",
    LABELS,
);
static TX_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_interface_transmit_bytes_total",
    "Number of bytes transmitted on the interface",
    LABELS,
);
static RX_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_interface_receive_bytes_total",
    "Number of bytes received on the interface",
    LABELS,
);
static TX_ERRORS: MetricDesc = MetricDesc::counter(
    "fortigate_interface_transmit_errors_total",
    "Number of transmission errors detected on the interface",
    LABELS,
);
static RX_ERRORS: MetricDesc = MetricDesc::counter(
    "fortigate_interface_receive_errors_total",
    "Number of reception errors detected on the interface",
    LABELS,
);

/// `interfaces`: link state, speed and traffic counters per interface.
///
/// Interfaces are keyed by name in the response.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<BTreeMap<String, Interface>>> =
        ctx.fetch_as(INTERFACE_PATH, INTERFACE_QUERY)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for (name, iface) in &envelope.results {
            let labels = [
                envelope.vdom.as_str(),
                name.as_str(),
                iface.alias.as_str(),
                iface.interface.as_str(),
            ];
            out.push(LINK_UP.emit(bool_value(iface.link), &labels));
            out.push(SPEED.emit(mbps_to_bps(iface.speed), &labels));
            out.push(TX_PACKETS.emit(iface.tx_packets, &labels));
            out.push(RX_PACKETS.emit(iface.rx_packets, &labels));
            out.push(TX_BYTES.emit(iface.tx_bytes, &labels));
            out.push(RX_BYTES.emit(iface.rx_bytes, &labels));
            out.push(TX_ERRORS.emit(iface.tx_errors, &labels));
            out.push(RX_ERRORS.emit(iface.rx_errors, &labels));
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
    fn test_interfaces_sorted_by_name() {
        let fetch = StaticFetch::new().with(
            INTERFACE_PATH,
            INTERFACE_QUERY,
            json!([{
                "vdom": "root",
                "results": {
                    "wan1": {"name": "wan1", "alias": "uplink", "link": true, "speed": 1000,
                             "tx_packets": 10, "rx_packets": 20, "tx_bytes": 1500, "rx_bytes": 3000},
                    "internal.10": {"name": "internal.10", "link": false, "interface": "internal", "vlanid": 10}
                }
            }]),
        );
        let options = ProbeOptions::default();
        let ctx = ScrapeContext::new(&fetch, None, None, &options, tracing::Span::none());

        let metrics = collect(&ctx).unwrap();

        let link: Vec<(&str, f64)> = metrics
            .iter()
            .filter(|m| m.name == "fortigate_interface_link_up")
            .map(|m| (m.label("name").unwrap(), m.value))
            .collect();
        assert_eq!(link, vec![("internal.10", 0.0), ("wan1", 1.0)]);

        let vlan = metrics
            .iter()
            .find(|m| m.label("name") == Some("internal.10"))
            .unwrap();
        assert_eq!(vlan.label("parent"), Some("internal"));

        let speed = metrics
            .iter()
            .find(|m| m.name == "fortigate_interface_speed_bps" && m.label("name") == Some("wan1"))
            .unwrap();
        assert_eq!(speed.value, 1e9);
    }
}
