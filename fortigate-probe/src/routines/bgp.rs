//! BGP neighbor sessions and learned paths.
//!
//! Path listings are paginated by the API; one page of
//! [`ProbeOptions::max_bgp_paths`](crate::ProbeOptions) entries is requested
//! per VDOM and counted per neighbor.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord, bool_value};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

const NEIGHBORS_PATH: &str = "monitor/router/bgp/neighbors";
const NEIGHBORS6_PATH: &str = "monitor/router/bgp/neighbors6";
const PATHS_PATH: &str = "monitor/router/bgp/paths";
const PATHS6_PATH: &str = "monitor/router/bgp/paths6";

/// BGP finite state machine states as reported by FortiOS.
const FSM_STATES: &[&str] = &[
    "Idle",
    "Connect",
    "Active",
    "OpenSent",
    "OpenConfirm",
    "Established",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Neighbor {
    neighbor_ip: String,
    local_ip: String,
    remote_as: u64,
    admin_status: bool,
    state: String,
}

impl Neighbor {
    fn info_labels<'a>(&'a self, vdom: &'a str, remote_as: &'a str) -> [&'a str; 5] {
        [
            vdom,
            self.neighbor_ip.as_str(),
            self.local_ip.as_str(),
            remote_as,
            self.state.as_str(),
        ]
    }
}

const INFO_LABELS: &[&str] = &["vdom", "neighbor_ip", "local_ip", "remote_as", "state"];

static NEIGHBOR_IPV4_INFO: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv4_info",
    "Configured bgp neighbor over ipv4, return state as value (1 - Idle, 2 - Connect, 3 - Active, 4 - Open sent, 5 - Open confirm, 6 - Established)",
    INFO_LABELS,
);
static NEIGHBOR_IPV6_INFO: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv6_info",
    "Configured bgp neighbor over ipv6, return state as value (1 - Idle, 2 - Connect, 3 - Active, 4 - Open sent, 5 - Open confirm, 6 - Established)",
    INFO_LABELS,
);
static NEIGHBOR_IPV4_STATE: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv4_state",
    "BGP session state of the ipv4 neighbor",
    &["vdom", "neighbor_ip", "state"],
);
static NEIGHBOR_IPV4_ADMIN: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv4_admin_up",
    "Whether the ipv4 neighbor is administratively enabled",
    &["vdom", "neighbor_ip"],
);

/// Numeric FSM state, 1-based, 0 when unrecognized.
fn fsm_value(state: &str) -> f64 {
    FSM_STATES
        .iter()
        .position(|s| *s == state)
        .map(|i| (i + 1) as f64)
        .unwrap_or(0.0)
}

fn neighbor_info(
    ctx: &ScrapeContext<'_>,
    path: &str,
    desc: &'static MetricDesc,
) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Vec<Neighbor>>> = ctx.fetch_as(path, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for neighbor in &envelope.results {
            let remote_as = neighbor.remote_as.to_string();
            let labels = neighbor.info_labels(&envelope.vdom, &remote_as);
            out.push(desc.emit(fsm_value(&neighbor.state), &labels));
        }
    }
    Ok(out)
}

/// `bgp_neighbors_ipv4`: info metric per IPv4 neighbor.
pub fn neighbors_ipv4(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    neighbor_info(ctx, NEIGHBORS_PATH, &NEIGHBOR_IPV4_INFO)
}

/// `bgp_neighbors_ipv6`: info metric per IPv6 neighbor.
pub fn neighbors_ipv6(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    neighbor_info(ctx, NEIGHBORS6_PATH, &NEIGHBOR_IPV6_INFO)
}

/// `bgp_neighbor_state_ipv4`: one indicator per FSM state and IPv4 neighbor.
pub fn neighbor_state_ipv4(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Vec<Neighbor>>> = ctx.fetch_as(NEIGHBORS_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for neighbor in &envelope.results {
            let labels = [envelope.vdom.as_str(), neighbor.neighbor_ip.as_str()];
            emit_states(&NEIGHBOR_IPV4_STATE, &labels, &neighbor.state, FSM_STATES, &mut out);
            out.push(NEIGHBOR_IPV4_ADMIN.emit(bool_value(neighbor.admin_status), &labels));
        }
    }
    Ok(out)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Path {
    learned_from: String,
    is_best: bool,
}

/// Metric families of one address family's path counts.
struct PathFamilies {
    paths: &'static MetricDesc,
    best: &'static MetricDesc,
}

static IPV4_PATHS: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv4_paths",
    "Count of BGP paths received from an ipv4 neighbor",
    &["vdom", "neighbor_ip"],
);
static IPV4_BEST_PATHS: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv4_best_paths",
    "Count of best BGP paths received from an ipv4 neighbor",
    &["vdom", "neighbor_ip"],
);
static IPV6_PATHS: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv6_paths",
    "Count of BGP paths received from an ipv6 neighbor",
    &["vdom", "neighbor_ip"],
);
static IPV6_BEST_PATHS: MetricDesc = MetricDesc::gauge(
    "fortigate_bgp_neighbor_ipv6_best_paths",
    "Count of best BGP paths received from an ipv6 neighbor",
    &["vdom", "neighbor_ip"],
);

static IPV4_FAMILIES: PathFamilies = PathFamilies {
    paths: &IPV4_PATHS,
    best: &IPV4_BEST_PATHS,
};
static IPV6_FAMILIES: PathFamilies = PathFamilies {
    paths: &IPV6_PATHS,
    best: &IPV6_BEST_PATHS,
};

#[derive(Debug, Default)]
struct PathCount {
    total: u64,
    best: u64,
}

fn path_counts(ctx: &ScrapeContext<'_>, path: &str, families: &PathFamilies) -> Result<Vec<MetricRecord>> {
    let max = ctx.options().max_bgp_paths;
    let query = format!("{VDOM_ALL}&start=0&count={max}");
    let envelopes: Vec<Envelope<Vec<Path>>> = ctx.fetch_as(path, &query)?;

    let mut counts: BTreeMap<(&str, &str), PathCount> = BTreeMap::new();
    for envelope in &envelopes {
        if envelope.results.len() >= max {
            tracing::warn!(
                parent: ctx.span(),
                vdom = %envelope.vdom,
                max,
                "BGP path listing truncated, counts are incomplete"
            );
        }
        for route in &envelope.results {
            let count = counts
                .entry((envelope.vdom.as_str(), route.learned_from.as_str()))
                .or_default();
            count.total += 1;
            if route.is_best {
                count.best += 1;
            }
        }
    }

    let mut out = Vec::with_capacity(counts.len() * 2);
    for ((vdom, neighbor), count) in counts {
        let labels = [vdom, neighbor];
        out.push(families.paths.emit(count.total as f64, &labels));
        out.push(families.best.emit(count.best as f64, &labels));
    }
    Ok(out)
}

/// `bgp_paths_ipv4`: learned and best path counts per IPv4 neighbor.
pub fn paths_ipv4(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    path_counts(ctx, PATHS_PATH, &IPV4_FAMILIES)
}

/// `bgp_paths_ipv6`: learned and best path counts per IPv6 neighbor.
pub fn paths_ipv6(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    path_counts(ctx, PATHS6_PATH, &IPV6_FAMILIES)
}
