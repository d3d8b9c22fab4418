//! SD-WAN health-check results.
//!
//! `results` maps health-check name to member interface to sample. The link
//! monitor endpoint uses the same sample shape, so both share
//! [`HealthFamilies`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::convert::{mbps_to_bps, millis_to_seconds, or_nan, percent_to_ratio};
use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

const HEALTH_CHECK_PATH: &str = "monitor/virtual-wan/health-check";

const SDWAN_STATES: &[&str] = &["up", "down", "error"];

/// One probe sample of a member interface.
///
/// Every measurement is optional: members that are down report only a
/// status.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HealthSample {
    pub status: String,
    pub latency: Option<f64>,
    pub jitter: Option<f64>,
    pub packet_loss: Option<f64>,
    pub packet_sent: Option<f64>,
    pub packet_received: Option<f64>,
    pub session: Option<f64>,
    pub tx_bandwidth: Option<f64>,
    pub rx_bandwidth: Option<f64>,
    pub state_changed: Option<f64>,
}

/// Metric families for one kind of health sample.
pub(crate) struct HealthFamilies {
    pub status: &'static MetricDesc,
    pub latency: &'static MetricDesc,
    pub jitter: &'static MetricDesc,
    pub loss: &'static MetricDesc,
    pub sent: &'static MetricDesc,
    pub received: &'static MetricDesc,
    pub sessions: &'static MetricDesc,
    pub tx_bandwidth: &'static MetricDesc,
    pub rx_bandwidth: &'static MetricDesc,
    pub state_changed: &'static MetricDesc,
}

impl HealthFamilies {
    /// Emit every family for one sample.
    ///
    /// Missing measurements are exported as NaN so each member keeps the same
    /// series set whatever its state.
    pub fn emit(
        &self,
        labels: &[&str],
        sample: &HealthSample,
        known_states: &[&str],
        out: &mut Vec<MetricRecord>,
    ) {
        emit_states(self.status, labels, &sample.status, known_states, out);
        out.push(self.latency.emit(millis_to_seconds(or_nan(sample.latency)), labels));
        out.push(self.jitter.emit(millis_to_seconds(or_nan(sample.jitter)), labels));
        out.push(self.loss.emit(percent_to_ratio(or_nan(sample.packet_loss)), labels));
        out.push(self.sent.emit(or_nan(sample.packet_sent), labels));
        out.push(self.received.emit(or_nan(sample.packet_received), labels));
        out.push(self.sessions.emit(or_nan(sample.session), labels));
        out.push(self.tx_bandwidth.emit(mbps_to_bps(or_nan(sample.tx_bandwidth)), labels));
        out.push(self.rx_bandwidth.emit(mbps_to_bps(or_nan(sample.rx_bandwidth)), labels));
        out.push(self.state_changed.emit(or_nan(sample.state_changed), labels));
    }
}

const LABELS: &[&str] = &["vdom", "sla", "interface"];

static STATUS: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_status",
    "Status of the SD-WAN member for the health check",
    &["vdom", "sla", "interface", "state"],
);
static LATENCY: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_latency_seconds",
    "Measured latency of the SD-WAN member",
    LABELS,
);
static JITTER: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_jitter_seconds",
    "Measured latency jitter of the SD-WAN member",
    LABELS,
);
static LOSS: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_packet_loss_ratio",
    "Measured packet loss of the SD-WAN member (0-1)",
    LABELS,
);
static SENT: MetricDesc = MetricDesc::counter(
    "fortigate_virtual_wan_packet_sent_total",
    "Probe packets sent through the SD-WAN member",
    LABELS,
);
static RECEIVED: MetricDesc = MetricDesc::counter(
    "fortigate_virtual_wan_packet_received_total",
    "Probe packets received through the SD-WAN member",
    LABELS,
);
static SESSIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_active_sessions",
    "Active sessions on the SD-WAN member",
    LABELS,
);
static TX_BANDWIDTH: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_bandwidth_tx_bps",
    "Transmit bandwidth of the SD-WAN member",
    LABELS,
);
static RX_BANDWIDTH: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_bandwidth_rx_bps",
    "Receive bandwidth of the SD-WAN member",
    LABELS,
);
static STATE_CHANGED: MetricDesc = MetricDesc::gauge(
    "fortigate_virtual_wan_status_change_time_seconds",
    "Unix time of the last status change of the SD-WAN member",
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

type HealthChecks = BTreeMap<String, BTreeMap<String, HealthSample>>;

/// `virtual_wan_health`: per health check and member interface.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<HealthChecks>> = ctx.fetch_as(HEALTH_CHECK_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for (sla, members) in &envelope.results {
            for (interface, sample) in members {
                let labels = [envelope.vdom.as_str(), sla.as_str(), interface.as_str()];
                FAMILIES.emit(&labels, sample, SDWAN_STATES, &mut out);
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

    fn run(fetch: &StaticFetch) -> Vec<MetricRecord> {
        let options = ProbeOptions::default();
        let ctx = ScrapeContext::new(fetch, None, None, &options, tracing::Span::none());
        collect(&ctx).unwrap()
    }

    #[test]
    fn test_health_check_members() {
        let fetch = StaticFetch::new().with(
            HEALTH_CHECK_PATH,
            VDOM_ALL,
            json!([{
                "vdom": "root",
                "results": {
                    "Default_DNS": {
                        "wan1": {
                            "status": "up", "latency": 4.5, "jitter": 0.25, "packet_loss": 2,
                            "packet_sent": 1000, "packet_received": 980, "session": 12,
                            "tx_bandwidth": 3, "rx_bandwidth": 8, "state_changed": 1700000000
                        },
                        "wan2": {"status": "down", "packet_loss": 100}
                    }
                }
            }]),
        );

        let metrics = run(&fetch);

        let wan1_latency = metrics
            .iter()
            .find(|m| m.name == "fortigate_virtual_wan_latency_seconds" && m.label("interface") == Some("wan1"))
            .unwrap();
        assert_eq!(wan1_latency.value, 0.0045);
        assert_eq!(wan1_latency.label("sla"), Some("Default_DNS"));

        let wan2_latency = metrics
            .iter()
            .find(|m| m.name == "fortigate_virtual_wan_latency_seconds" && m.label("interface") == Some("wan2"))
            .unwrap();
        assert!(wan2_latency.value.is_nan());

        let wan2_states: Vec<(&str, f64)> = metrics
            .iter()
            .filter(|m| m.name == "fortigate_virtual_wan_status" && m.label("interface") == Some("wan2"))
            .map(|m| (m.label("state").unwrap(), m.value))
            .collect();
        assert_eq!(
            wan2_states,
            vec![("up", 0.0), ("down", 1.0), ("error", 0.0), ("unknown", 0.0)]
        );
    }

    #[test]
    fn test_no_health_checks() {
        let fetch = StaticFetch::new().with(
            HEALTH_CHECK_PATH,
            VDOM_ALL,
            json!([{"vdom": "root", "results": {}}]),
        );

        assert!(run(&fetch).is_empty());
    }
}
