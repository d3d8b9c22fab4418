//! Link monitor probes, keyed by monitor name then interface.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::routines::virtual_wan::{HealthFamilies, HealthSample};
use crate::scrape::ScrapeContext;

const LINK_MONITOR_PATH: &str = "monitor/system/link-monitor";

const LINK_STATES: &[&str] = &["up", "down", "die"];

const LABELS: &[&str] = &["vdom", "monitor", "interface"];

static STATUS: MetricDesc = MetricDesc::gauge(
    "fortigate_link_status",
    "Signals the status of the link",
    &["vdom", "monitor", "interface", "state"],
);
static LATENCY: MetricDesc = MetricDesc::gauge(
    "fortigate_link_latency_seconds",
    "Average latency of the link over the monitor interval",
    LABELS,
);
static JITTER: MetricDesc = MetricDesc::gauge(
    "fortigate_link_latency_jitter_seconds",
    "Average latency jitter of the link over the monitor interval",
    LABELS,
);
static LOSS: MetricDesc = MetricDesc::gauge(
    "fortigate_link_packet_loss_ratio",
    "Percentage of packets lost on the link (0-1)",
    LABELS,
);
static SENT: MetricDesc = MetricDesc::counter(
    "fortigate_link_packet_sent_total",
    "Number of probe packets sent",
    LABELS,
);
static RECEIVED: MetricDesc = MetricDesc::counter(
    "fortigate_link_packet_received_total",
    "Number of probe packets received",
    LABELS,
);
static SESSIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_link_active_sessions",
    "Number of sessions using the link",
    LABELS,
);
static TX_BANDWIDTH: MetricDesc = MetricDesc::gauge(
    "fortigate_link_bandwidth_tx_bps",
    "Transmit bandwidth of the link",
    LABELS,
);
static RX_BANDWIDTH: MetricDesc = MetricDesc::gauge(
    "fortigate_link_bandwidth_rx_bps",
    "Receive bandwidth of the link",
    LABELS,
);
static STATE_CHANGED: MetricDesc = MetricDesc::gauge(
    "fortigate_link_status_change_time_seconds",
    "Unix time of the last status change of the link",
    LABELS,
);

static FAMILIES: HealthFamilies = HealthFamilies {
    status: &STATUS,
    latency: &LATENCY,
    jitter: &JITTER,
    loss: &LOSS,
    sent: &SENT,
    received: &RECEIVED,
    sessions: &SESSIONS,
    tx_bandwidth: &TX_BANDWIDTH,
    rx_bandwidth: &RX_BANDWIDTH,
    state_changed: &STATE_CHANGED,
};

type Monitors = BTreeMap<String, BTreeMap<String, HealthSample>>;

/// `system_link_monitor`: one sample per monitor and interface.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Monitors>> = ctx.fetch_as(LINK_MONITOR_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for (monitor, links) in &envelope.results {
            for (interface, sample) in links {
                let labels = [envelope.vdom.as_str(), monitor.as_str(), interface.as_str()];
                FAMILIES.emit(&labels, sample, LINK_STATES, &mut out);
            }
        }
    }
    Ok(out)
}
