use serde::Deserialize;

use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

const OSPF_NEIGHBORS_PATH: &str = "monitor/router/ospf/neighbors";

/// OSPF neighbor adjacency states.
const ADJACENCY_STATES: &[&str] = &[
    "Down", "Attempt", "Init", "2-Way", "ExStart", "Exchange", "Loading", "Full",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Neighbor {
    neighbor_ip: String,
    router_id: String,
    priority: f64,
    state: String,
}

static STATE: MetricDesc = MetricDesc::gauge(
    "fortigate_ospf_neighbor_state",
    "Adjacency state of the OSPF neighbor",
    &["vdom", "neighbor_ip", "router_id", "state"],
);
static PRIORITY: MetricDesc = MetricDesc::gauge(
    "fortigate_ospf_neighbor_priority",
    "Designated router election priority of the OSPF neighbor",
    &["vdom", "neighbor_ip", "router_id"],
);

/// `ospf_neighbors`: adjacency state per neighbor.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Vec<Neighbor>>> = ctx.fetch_as(OSPF_NEIGHBORS_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for neighbor in &envelope.results {
            let labels = [
                envelope.vdom.as_str(),
                neighbor.neighbor_ip.as_str(),
                neighbor.router_id.as_str(),
            ];
            emit_states(&STATE, &labels, &neighbor.state, ADJACENCY_STATES, &mut out);
            out.push(PRIORITY.emit(neighbor.priority, &labels));
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
    fn test_adjacency_state() {
        let fetch = StaticFetch::new().with(
            OSPF_NEIGHBORS_PATH,
            VDOM_ALL,
            json!([
                {"vdom": "root", "results": [{"neighbor_ip": "10.1.0.2", "router_id": "10.255.0.2", "priority": 1, "state": "Full"}]},
                {"vdom": "dmz", "results": [{"neighbor_ip": "10.2.0.2", "router_id": "10.255.0.3", "priority": 0, "state": "2-Way"}]}
            ]),
        );
        let options = ProbeOptions::default();
        let ctx = ScrapeContext::new(&fetch, None, None, &options, tracing::Span::none());

        let metrics = collect(&ctx).unwrap();

        let active: Vec<(&str, &str)> = metrics
            .iter()
            .filter(|m| m.name == "fortigate_ospf_neighbor_state" && m.value == 1.0)
            .map(|m| (m.label("vdom").unwrap(), m.label("state").unwrap()))
            .collect();
        assert_eq!(active, vec![("root", "Full"), ("dmz", "2-Way")]);
    }
}
