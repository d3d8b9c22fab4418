//! Integration tests for the routine table.
//!
//! These tests run full scrapes against canned FortiOS responses and check
//! what reaches the caller: metrics, the overall success flag and the
//! endpoints that were queried.

use fortigate_probe::{ProbeOptions, RoutineFilter, StaticFetch, scrape};
use serde_json::{Value, json};
use tracing::Span;

/// Helper to build a status response for a firmware version.
fn status(version: &str) -> Value {
    json!({
        "results": {"model_name": "FortiGate", "model_number": "100F", "model": "FGT100F", "hostname": "edge01"},
        "vdom": "root",
        "serial": "FG100FTK19000001",
        "version": version,
        "build": 1517
    })
}

/// Helper to restrict a scrape to the given routines.
fn only(routines: &[&str]) -> ProbeOptions {
    ProbeOptions {
        routines: RoutineFilter::new(routines, &[]).unwrap(),
        ..Default::default()
    }
}

fn bgp_paths() -> Value {
    json!([
        {"vdom": "root", "results": [
            {"nlri_prefix": "192.0.2.0", "nlri_prefix_len": 24, "learned_from": "10.0.0.1", "next_hop": "10.0.0.1", "is_best": true},
            {"nlri_prefix": "198.51.100.0", "nlri_prefix_len": 24, "learned_from": "10.0.0.2", "next_hop": "10.0.0.2", "is_best": true},
            {"nlri_prefix": "192.0.2.0", "nlri_prefix_len": 24, "learned_from": "10.0.0.2", "next_hop": "10.0.0.2", "is_best": false}
        ]},
        {"vdom": "dmz", "results": [
            {"nlri_prefix": "203.0.113.0", "nlri_prefix_len": 24, "learned_from": "10.1.0.1", "next_hop": "10.1.0.1", "is_best": true},
            {"nlri_prefix": "203.0.113.128", "nlri_prefix_len": 25, "learned_from": "10.1.0.2", "next_hop": "10.1.0.2", "is_best": true},
            {"nlri_prefix": "203.0.113.0", "nlri_prefix_len": 24, "learned_from": "10.1.0.2", "next_hop": "10.1.0.2", "is_best": false}
        ]}
    ])
}

#[test]
fn test_bgp_paths_grouped_per_vdom_and_neighbor() {
    let fetch = StaticFetch::new()
        .with("monitor/system/status", "", status("v7.2.5"))
        .with("monitor/router/bgp/paths", "vdom=*&start=0&count=10000", bgp_paths());

    let report = scrape(&fetch, &only(&["bgp_paths_ipv4"]), Span::none());

    assert!(report.ok);
    let rows: Vec<(String, &str, &str, f64)> = report
        .metrics
        .iter()
        .map(|m| {
            (
                m.name.trim_start_matches("fortigate_bgp_neighbor_ipv4_").to_string(),
                m.label("vdom").unwrap(),
                m.label("neighbor_ip").unwrap(),
                m.value,
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("paths".to_string(), "dmz", "10.1.0.1", 1.0),
            ("best_paths".to_string(), "dmz", "10.1.0.1", 1.0),
            ("paths".to_string(), "dmz", "10.1.0.2", 2.0),
            ("best_paths".to_string(), "dmz", "10.1.0.2", 1.0),
            ("paths".to_string(), "root", "10.0.0.1", 1.0),
            ("best_paths".to_string(), "root", "10.0.0.1", 1.0),
            ("paths".to_string(), "root", "10.0.0.2", 2.0),
            ("best_paths".to_string(), "root", "10.0.0.2", 1.0),
        ]
    );
}

#[test]
fn test_scrape_is_idempotent() {
    let fetch = StaticFetch::new()
        .with("monitor/system/status", "", status("v7.2.5"))
        .with("monitor/router/bgp/paths", "vdom=*&start=0&count=10000", bgp_paths())
        .with(
            "monitor/system/vdom-resource",
            "vdom=*",
            json!([{"vdom": "root", "results": {
                "cpu": 1, "memory": 2, "setup_rate": 0, "id": 0, "deletable": false,
                "session": {"current_usage": 5, "usage_percent": 1, "custom_max": 0, "guaranteed": 0},
                "firewall-policy": {"current_usage": 12, "usage_percent": 0, "custom_max": 0, "guaranteed": 0},
                "ipsec-phase1": {"current_usage": 0, "usage_percent": 0, "custom_max": 0, "guaranteed": 0}
            }}]),
        );
    let options = only(&["bgp_paths_ipv4", "system_vdom_resources"]);

    let first = scrape(&fetch, &options, Span::none());
    let second = scrape(&fetch, &options, Span::none());

    assert!(!first.metrics.is_empty());
    assert_eq!(format!("{:?}", first.metrics), format!("{:?}", second.metrics));
}

#[test]
fn test_failing_routine_does_not_stop_others() {
    // Interfaces answer 500, license status is valid.
    let fetch = StaticFetch::new()
        .with("monitor/system/status", "", status("v7.0.12"))
        .with_status(
            "monitor/system/interface/select",
            "vdom=*&include_vlan=true&include_aggregate=true",
            500,
        )
        .with(
            "monitor/license/status",
            "",
            json!({"results": {"vdom": {"used": 1, "max": 10}, "forticare": {"registration_status": "registered"}}}),
        );

    let report = scrape(
        &fetch,
        &only(&["system_status", "interfaces", "license_status"]),
        Span::none(),
    );

    assert!(!report.ok);
    let outcomes: Vec<(&str, &str)> = report.routines.iter().map(|r| (r.name, r.outcome)).collect();
    assert_eq!(
        outcomes,
        vec![
            ("system_status", "collected"),
            ("license_status", "collected"),
            ("interfaces", "failed"),
        ]
    );
    assert!(report.metrics.iter().any(|m| m.name == "fortigate_version_info"));
    assert!(report.metrics.iter().any(|m| m.name == "fortigate_license_vdom_usage"));
}

#[test]
fn test_sensor_routine_skipped_on_older_firmware() {
    let fetch = StaticFetch::new().with("monitor/system/status", "", status("v6.4.4"));

    let report = scrape(&fetch, &only(&["system_sensor_info"]), Span::none());

    assert!(report.ok);
    assert!(report.metrics.is_empty());
    assert_eq!(report.routines[0].outcome, "skipped");
    assert!(fetch.calls().iter().all(|(path, _)| path == "monitor/system/status"));
}

#[test]
fn test_unknown_firmware_skips_gated_routines() {
    let fetch = StaticFetch::new().with("monitor/system/status", "", status("1.0.0"));

    let report = scrape(&fetch, &only(&["bgp_*", "ospf_neighbors"]), Span::none());

    assert!(report.ok);
    assert_eq!(report.metadata, None);
    assert!(report.routines.iter().all(|r| r.outcome == "skipped"));
}

fn firewall_fetch(version: &str) -> StaticFetch {
    let empty = json!([{"vdom": "root", "results": []}]);
    StaticFetch::new()
        .with("monitor/system/status", "", status(version))
        .with(
            "cmdb/firewall/policy",
            "vdom=*",
            json!([{"vdom": "root", "results": [
                {"policyid": 1, "uuid": "0b5e-1", "name": "Allow outbound"},
                {"policyid": 2, "uuid": "0b5e-2", "name": "Allow DNS"}
            ]}]),
        )
        .with("cmdb/firewall/policy6", "vdom=*", empty.clone())
        .with(
            "monitor/firewall/policy/select",
            "vdom=*&ip_version=ipv4",
            json!([{"vdom": "root", "results": [
                {"policyid": 0, "active_sessions": 0, "bytes": 0, "packets": 0, "hit_count": 42},
                {"policyid": 1, "uuid": "0b5e-1", "active_sessions": 3, "bytes": 1200, "packets": 10, "hit_count": 8},
                {"policyid": 7, "uuid": "dead-beef", "hit_count": 1}
            ]}]),
        )
        .with("monitor/firewall/policy/select", "vdom=*&ip_version=ipv6", empty.clone())
        .with(
            "monitor/firewall/policy/select",
            "vdom=*",
            json!([{"vdom": "root", "results": [
                {"policyid": 2, "uuid": "0b5e-2", "hit_count": 4}
            ]}]),
        )
        .with("monitor/firewall/policy6/select", "vdom=*", empty)
}

#[test]
fn test_firewall_endpoints_follow_firmware() {
    let combined = firewall_fetch("v6.4.4");
    let report = scrape(&combined, &only(&["firewall_policies"]), Span::none());
    assert!(report.ok);
    let calls = combined.calls();
    assert!(calls.contains(&(
        "monitor/firewall/policy/select".to_string(),
        "vdom=*&ip_version=ipv6".to_string()
    )));
    assert!(!calls.iter().any(|(path, _)| path.contains("policy6")));

    let split = firewall_fetch("v6.2.9");
    let report = scrape(&split, &only(&["firewall_policies"]), Span::none());
    assert!(report.ok);
    let calls = split.calls();
    assert!(calls.iter().any(|(path, _)| path == "monitor/firewall/policy6/select"));
    assert!(calls.iter().any(|(path, _)| path == "cmdb/firewall/policy6"));
    assert!(!calls.iter().any(|(_, query)| query.contains("ip_version")));
}

#[test]
fn test_policy_names_resolved_end_to_end() {
    let fetch = firewall_fetch("v7.0.12");

    let report = scrape(&fetch, &only(&["firewall_policies"]), Span::none());

    let names: Vec<(&str, &str)> = report
        .metrics
        .iter()
        .filter(|m| m.name == "fortigate_policy_hit_count_total")
        .map(|m| (m.label("policy_id").unwrap(), m.label("name").unwrap()))
        .collect();
    assert_eq!(
        names,
        vec![("0", "Implicit Deny"), ("1", "Allow outbound"), ("7", "<UNKNOWN>")]
    );
}

#[test]
fn test_every_metric_family_has_consistent_labels() {
    let fetch = firewall_fetch("v7.0.12")
        .with("monitor/router/bgp/paths", "vdom=*&start=0&count=10000", bgp_paths());

    let report = scrape(&fetch, &only(&["firewall_policies", "bgp_paths_ipv4"]), Span::none());

    let mut keys: std::collections::HashMap<&str, Vec<&str>> = std::collections::HashMap::new();
    for metric in &report.metrics {
        let labels: Vec<&str> = metric.labels.iter().map(|(k, _)| *k).collect();
        let expected = keys.entry(metric.name).or_insert_with(|| labels.clone());
        assert_eq!(*expected, labels, "label keys differ within {}", metric.name);
    }
}
