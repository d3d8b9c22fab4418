//! Collection routines, one per monitored resource type.
//!
//! Each routine is a plain function from the scrape context to a list of
//! metric records. Firmware requirements live in [`ROUTINES`] so they are
//! checked by the harness before anything is fetched.

pub mod bgp;
pub mod certificates;
pub mod firewall;
pub mod fortiguard;
pub mod interfaces;
pub mod license;
pub mod link_monitor;
pub mod ospf;
pub mod sensors;
pub mod switch;
pub mod system;
pub mod virtual_wan;
pub mod vpn;
pub mod wifi;

use crate::routine::Routine;

/// Query selecting every VDOM.
pub(crate) const VDOM_ALL: &str = "vdom=*";

/// The routine table, in execution order.
pub static ROUTINES: &[Routine] = &[
    Routine::new("system_status", system::status),
    Routine::new("system_resources", system::resources),
    Routine::new("system_vdom_resources", system::vdom_resources),
    Routine::new("system_ha_statistics", system::ha_statistics),
    Routine::new("system_link_monitor", link_monitor::collect),
    Routine::new("system_fortiguard_servers", fortiguard::collect),
    Routine::new("system_sensor_info", sensors::collect).since(7, 0),
    Routine::new("license_status", license::collect),
    Routine::new("interfaces", interfaces::collect),
    Routine::new("firewall_policies", firewall::collect),
    Routine::new("virtual_wan_health", virtual_wan::collect),
    Routine::new("ipsec_tunnels", vpn::ipsec),
    Routine::new("ssl_vpn", vpn::ssl),
    Routine::new("bgp_neighbors_ipv4", bgp::neighbors_ipv4).since(6, 0),
    Routine::new("bgp_neighbor_state_ipv4", bgp::neighbor_state_ipv4).since(6, 0),
    Routine::new("bgp_neighbors_ipv6", bgp::neighbors_ipv6).since(6, 0),
    Routine::new("bgp_paths_ipv4", bgp::paths_ipv4).since(6, 2),
    Routine::new("bgp_paths_ipv6", bgp::paths_ipv6).since(6, 2),
    Routine::new("ospf_neighbors", ospf::collect).since(6, 4),
    Routine::new("wifi_managed_aps", wifi::collect).since(6, 2),
    Routine::new("switch_ports", switch::collect),
    Routine::new("certificates", certificates::collect),
];
