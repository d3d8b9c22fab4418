//! IPsec tunnels and SSL-VPN sessions.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

const IPSEC_PATH: &str = "monitor/vpn/ipsec";
const SSL_PATH: &str = "monitor/vpn/ssl";
const SSL_STATS_PATH: &str = "monitor/vpn/ssl/stats";

const TUNNEL_STATES: &[&str] = &["up", "down"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tunnel {
    name: String,
    rgwy: String,
    proxyid: Vec<ProxyId>,
}

/// Phase 2 selector of a tunnel.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyId {
    p2name: String,
    status: String,
    incoming_bytes: f64,
    outgoing_bytes: f64,
    expire: f64,
}

const IPSEC_LABELS: &[&str] = &["vdom", "name", "phase2", "remote_gateway"];

static TUNNEL_STATUS: MetricDesc = MetricDesc::gauge(
    "fortigate_ipsec_tunnel_status",
    "Status of the IPsec tunnel phase 2",
    &["vdom", "name", "phase2", "remote_gateway", "state"],
);
static TUNNEL_RECEIVE: MetricDesc = MetricDesc::counter(
    "fortigate_ipsec_tunnel_receive_bytes_total",
    "Total number of bytes received over the IPsec tunnel",
    IPSEC_LABELS,
);
static TUNNEL_TRANSMIT: MetricDesc = MetricDesc::counter(
    "fortigate_ipsec_tunnel_transmit_bytes_total",
    "Total number of bytes transmitted over the IPsec tunnel",
    IPSEC_LABELS,
);
static TUNNEL_EXPIRE: MetricDesc = MetricDesc::gauge(
    "fortigate_ipsec_tunnel_expire_seconds",
    "Seconds until the phase 2 key expires",
    IPSEC_LABELS,
);

/// `ipsec_tunnels`: status and traffic per tunnel phase 2.
pub fn ipsec(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Vec<Tunnel>>> = ctx.fetch_as(IPSEC_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &envelopes {
        for tunnel in &envelope.results {
            for proxy in &tunnel.proxyid {
                let labels = [
                    envelope.vdom.as_str(),
                    tunnel.name.as_str(),
                    proxy.p2name.as_str(),
                    tunnel.rgwy.as_str(),
                ];
                emit_states(&TUNNEL_STATUS, &labels, &proxy.status, TUNNEL_STATES, &mut out);
                out.push(TUNNEL_RECEIVE.emit(proxy.incoming_bytes, &labels));
                out.push(TUNNEL_TRANSMIT.emit(proxy.outgoing_bytes, &labels));
                out.push(TUNNEL_EXPIRE.emit(proxy.expire, &labels));
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SslSession {
    user_name: String,
    subsessions: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SslStats {
    current: SslCounts,
    max: SslCounts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SslCounts {
    users: f64,
    tunnels: f64,
    connections: f64,
}

static SSL_USERS: MetricDesc = MetricDesc::gauge(
    "fortigate_vpn_ssl_users",
    "Number of users connected to the SSL-VPN",
    &["vdom"],
);
static SSL_TUNNELS: MetricDesc = MetricDesc::gauge(
    "fortigate_vpn_ssl_tunnels",
    "Number of active SSL-VPN tunnels",
    &["vdom"],
);
static SSL_CONNECTIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_vpn_ssl_connections",
    "Number of active SSL-VPN web connections",
    &["vdom"],
);
static SSL_MAX_USERS: MetricDesc = MetricDesc::gauge(
    "fortigate_vpn_ssl_users_max",
    "Highest number of SSL-VPN users seen",
    &["vdom"],
);
static SSL_USER_SESSIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_vpn_ssl_user_sessions",
    "Number of SSL-VPN sessions of a user",
    &["vdom", "user"],
);
static SSL_USER_TUNNELS: MetricDesc = MetricDesc::gauge(
    "fortigate_vpn_ssl_user_tunnels",
    "Number of SSL-VPN tunnel subsessions of a user",
    &["vdom", "user"],
);

/// `ssl_vpn`: aggregate counts plus sessions grouped per user.
pub fn ssl(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let stats: Vec<Envelope<SslStats>> = ctx.fetch_as(SSL_STATS_PATH, VDOM_ALL)?;
    let sessions: Vec<Envelope<Vec<SslSession>>> = ctx.fetch_as(SSL_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in &stats {
        let labels = [envelope.vdom.as_str()];
        let current = &envelope.results.current;
        out.push(SSL_USERS.emit(current.users, &labels));
        out.push(SSL_TUNNELS.emit(current.tunnels, &labels));
        out.push(SSL_CONNECTIONS.emit(current.connections, &labels));
        out.push(SSL_MAX_USERS.emit(envelope.results.max.users, &labels));
    }

    for envelope in &sessions {
        // One user can hold several sessions; the API lists them separately.
        let mut per_user: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for session in &envelope.results {
            let entry = per_user.entry(session.user_name.as_str()).or_default();
            entry.0 += 1;
            entry.1 += session.subsessions.len() as u64;
        }
        for (user, (count, tunnels)) in per_user {
            let labels = [envelope.vdom.as_str(), user];
            out.push(SSL_USER_SESSIONS.emit(count as f64, &labels));
            out.push(SSL_USER_TUNNELS.emit(tunnels as f64, &labels));
        }
    }
    Ok(out)
}
