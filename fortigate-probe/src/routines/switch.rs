//! FortiSwitch ports managed by the switch controller.
//!
//! Each switch reports port configuration as a list and traffic statistics
//! as an object keyed by port name. Both are joined on the port name.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::correlate::{CorrelationIndex, correlate};
use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

const MANAGED_SWITCH_PATH: &str = "monitor/switch-controller/managed-switch";

const PORT_STATES: &[&str] = &["up", "down"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManagedSwitch {
    name: String,
    serial: String,
    ports: Vec<Port>,
    port_stats: BTreeMap<String, PortStats>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Port {
    interface: String,
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PortStats {
    tx_bytes: f64,
    rx_bytes: f64,
    tx_packets: f64,
    rx_packets: f64,
    tx_errors: f64,
    rx_errors: f64,
    crc_alignments: f64,
}

const LABELS: &[&str] = &["vdom", "switch_name", "serial", "port"];

static PORT_STATUS: MetricDesc = MetricDesc::gauge(
    "fortigate_managed_switch_port_status",
    "Link status of the switch port",
    &["vdom", "switch_name", "serial", "port", "state"],
);
static TX_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_tx_bytes_total",
    "Bytes transmitted on the switch port",
    LABELS,
);
static RX_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_rx_bytes_total",
    "Bytes received on the switch port",
    LABELS,
);
static TX_PACKETS: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_tx_packets_total",
    "Packets transmitted on the switch port",
    LABELS,
);
static RX_PACKETS: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_rx_packets_total",
    "Packets received on the switch port",
    LABELS,
);
static TX_ERRORS: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_tx_errors_total",
    "Transmit errors on the switch port",
    LABELS,
);
static RX_ERRORS: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_rx_errors_total",
    "Receive errors on the switch port",
    LABELS,
);
static CRC_ALIGNMENTS: MetricDesc = MetricDesc::counter(
    "fortigate_managed_switch_crc_alignments_total",
    "CRC and alignment errors on the switch port",
    LABELS,
);

/// `switch_ports`: status and counters per managed switch port.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Vec<ManagedSwitch>>> =
        ctx.fetch_as(MANAGED_SWITCH_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for switch in &envelope.results {
            let index = CorrelationIndex::build(&switch.ports, |p| p.interface.as_str());
            let stats: Vec<(&String, &PortStats)> = switch.port_stats.iter().collect();

            for (&(port, stats), config) in correlate(&stats, &index, |(port, _)| port.as_str()) {
                let labels = [
                    envelope.vdom.as_str(),
                    switch.name.as_str(),
                    switch.serial.as_str(),
                    port.as_str(),
                ];
                // Ports without configuration have no status; fan-out marks them unknown.
                let status = config.map(|p| p.status.as_str()).unwrap_or_default();
                emit_states(&PORT_STATUS, &labels, status, PORT_STATES, &mut out);
                out.push(TX_BYTES.emit(stats.tx_bytes, &labels));
                out.push(RX_BYTES.emit(stats.rx_bytes, &labels));
                out.push(TX_PACKETS.emit(stats.tx_packets, &labels));
                out.push(RX_PACKETS.emit(stats.rx_packets, &labels));
                out.push(TX_ERRORS.emit(stats.tx_errors, &labels));
                out.push(RX_ERRORS.emit(stats.rx_errors, &labels));
                out.push(CRC_ALIGNMENTS.emit(stats.crc_alignments, &labels));
            }
        }
    }
    Ok(out)
}
