//! FortiGuard update server reachability.

use serde::Deserialize;
use serde_json::Value;

use crate::convert::rtt_value;
use crate::error::Result;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::scrape::ScrapeContext;

const SERVER_INFO_PATH: &str = "monitor/system/fortiguard/server-info";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Server {
    ip: String,
    weight: f64,
    /// Milliseconds, as a number or a string such as `"<1"`.
    rtt: Value,
    packet_loss: f64,
}

const LABELS: &[&str] = &["ip"];

static RTT: MetricDesc = MetricDesc::gauge(
    "fortigate_fortiguard_server_rtt_seconds",
    "Round-trip time to the FortiGuard server",
    LABELS,
);
static WEIGHT: MetricDesc = MetricDesc::gauge(
    "fortigate_fortiguard_server_weight",
    "Selection weight of the FortiGuard server",
    LABELS,
);
static PACKET_LOSS: MetricDesc = MetricDesc::counter(
    "fortigate_fortiguard_server_packet_loss_total",
    "Packets lost towards the FortiGuard server",
    LABELS,
);

/// `system_fortiguard_servers`: one set of gauges per known server.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let info: Envelope<Vec<Server>> = ctx.fetch_as(SERVER_INFO_PATH, "")?;

    let mut out = Vec::with_capacity(info.results.len() * 3);
    for server in &info.results {
        let labels = [server.ip.as_str()];
        out.push(RTT.emit(rtt_value(&server.rtt), &labels));
        out.push(WEIGHT.emit(server.weight, &labels));
        out.push(PACKET_LOSS.emit(server.packet_loss, &labels));
    }
    Ok(out)
}
