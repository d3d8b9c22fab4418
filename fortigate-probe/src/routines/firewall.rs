//! Firewall policy statistics joined with policy configuration.
//!
//! Statistics carry only the numeric policy id and uuid; the human-readable
//! name comes from the `cmdb` configuration and is joined on `uuid`.

use serde::Deserialize;

use crate::correlate::{CorrelationIndex, correlate, correlation_label};
use crate::error::Result;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;
use crate::version::ApiPolicy;

const POLICY_STATS_PATH: &str = "monitor/firewall/policy/select";
const POLICY6_STATS_PATH: &str = "monitor/firewall/policy6/select";
const POLICY_CONFIG_PATH: &str = "cmdb/firewall/policy";
const POLICY6_CONFIG_PATH: &str = "cmdb/firewall/policy6";

const IPV4_QUERY: &str = "vdom=*&ip_version=ipv4";
const IPV6_QUERY: &str = "vdom=*&ip_version=ipv6";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PolicyStats {
    policyid: u64,
    uuid: Option<String>,
    active_sessions: f64,
    bytes: f64,
    packets: f64,
    hit_count: f64,
    software_bytes: f64,
    asic_bytes: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PolicyConfig {
    uuid: String,
    name: String,
}

/// One statistics endpoint and the protocol label its results get.
struct StatsSource {
    protocol: &'static str,
    path: &'static str,
    query: &'static str,
}

fn stats_sources(policy: ApiPolicy) -> [StatsSource; 2] {
    if policy.combined_policy_stats {
        [
            StatsSource {
                protocol: "ipv4",
                path: POLICY_STATS_PATH,
                query: IPV4_QUERY,
            },
            StatsSource {
                protocol: "ipv6",
                path: POLICY_STATS_PATH,
                query: IPV6_QUERY,
            },
        ]
    } else {
        [
            StatsSource {
                protocol: "ipv4",
                path: POLICY_STATS_PATH,
                query: VDOM_ALL,
            },
            StatsSource {
                protocol: "ipv6",
                path: POLICY6_STATS_PATH,
                query: VDOM_ALL,
            },
        ]
    }
}

fn config_paths(policy: ApiPolicy) -> &'static [&'static str] {
    if policy.combined_policy_stats {
        &[POLICY_CONFIG_PATH]
    } else {
        &[POLICY_CONFIG_PATH, POLICY6_CONFIG_PATH]
    }
}

const LABELS: &[&str] = &["vdom", "protocol", "name", "policy_id", "uuid"];

static ACTIVE_SESSIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_policy_active_sessions",
    "Number of active sessions for a policy",
    LABELS,
);
static BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_policy_bytes_total",
    "Number of bytes that have passed through a policy",
    LABELS,
);
static PACKETS: MetricDesc = MetricDesc::counter(
    "fortigate_policy_packets_total",
    "Number of packets that have passed through a policy",
    LABELS,
);
static HITS: MetricDesc = MetricDesc::counter(
    "fortigate_policy_hit_count_total",
    "Number of times a policy has been hit",
    LABELS,
);
static SOFTWARE_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_policy_software_bytes_total",
    "Bytes of a policy handled by the CPU",
    LABELS,
);
static ASIC_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_policy_asic_bytes_total",
    "Bytes of a policy offloaded to the network processor",
    LABELS,
);

/// `firewall_policies`: per-policy counters labeled with the configured
/// policy name.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let policy = ctx.policy();

    let mut configs: Vec<PolicyConfig> = Vec::new();
    for path in config_paths(policy) {
        let envelopes: Vec<Envelope<Vec<PolicyConfig>>> = ctx.fetch_as(path, VDOM_ALL)?;
        configs.extend(envelopes.into_iter().flat_map(|e| e.results));
    }
    let index = CorrelationIndex::build(&configs, |c| c.uuid.as_str());

    let mut out = Vec::new();
    for source in stats_sources(policy) {
        let envelopes: Vec<Envelope<Vec<PolicyStats>>> =
            ctx.fetch_as(source.path, source.query)?;

        for envelope in &envelopes {
            let pairs = correlate(&envelope.results, &index, |s| {
                s.uuid.as_deref().unwrap_or_default()
            });
            for (stats, config) in pairs {
                let name = correlation_label(stats.policyid, config.map(|c| c.name.as_str()));
                let id = stats.policyid.to_string();
                let labels = [
                    envelope.vdom.as_str(),
                    source.protocol,
                    name,
                    id.as_str(),
                    stats.uuid.as_deref().unwrap_or_default(),
                ];
                out.push(ACTIVE_SESSIONS.emit(stats.active_sessions, &labels));
                out.push(BYTES.emit(stats.bytes, &labels));
                out.push(PACKETS.emit(stats.packets, &labels));
                out.push(HITS.emit(stats.hit_count, &labels));
                out.push(SOFTWARE_BYTES.emit(stats.software_bytes, &labels));
                out.push(ASIC_BYTES.emit(stats.asic_bytes, &labels));
            }
        }
    }
    Ok(out)
}
