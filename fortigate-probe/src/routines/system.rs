//! System identity, resource usage and HA cluster statistics.

use serde::Deserialize;
use serde_json::Value;

use crate::convert::percent_to_ratio;
use crate::decode::{DynamicRecord, FixedFields, decode};
use crate::error::{ProbeError, Result};
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::routines::VDOM_ALL;
use crate::scrape::ScrapeContext;

/// Endpoint resolved once per scrape for the firmware identity.
pub const STATUS_PATH: &str = "monitor/system/status";

const RESOURCE_USAGE_PATH: &str = "monitor/system/resource/usage";
const RESOURCE_USAGE_QUERY: &str = "interval=1-min&scope=global";
const VDOM_RESOURCE_PATH: &str = "monitor/system/vdom-resource";
const HA_STATISTICS_PATH: &str = "monitor/system/ha-statistics";

/// Payload of `monitor/system/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemStatus {
    pub model_name: String,
    pub model_number: String,
    pub model: String,
    pub hostname: String,
}

static VERSION_INFO: MetricDesc = MetricDesc::gauge(
    "fortigate_version_info",
    "System version and build information",
    &["serial", "version", "build", "model", "hostname"],
);

/// `system_status`: identity reported through an info metric.
pub fn status(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let status = ctx
        .status()
        .ok_or(ProbeError::Unavailable("system status"))?;

    let build = status.build.map(|b| b.to_string()).unwrap_or_default();
    Ok(vec![VERSION_INFO.emit(
        1.0,
        &[
            status.serial.as_deref().unwrap_or_default(),
            status.version.as_deref().unwrap_or_default(),
            &build,
            &status.results.model,
            &status.results.hostname,
        ],
    )])
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceUsage {
    cpu: Vec<UsageSample>,
    mem: Vec<UsageSample>,
    disk: Vec<UsageSample>,
    session: Vec<UsageSample>,
    session6: Vec<UsageSample>,
}

#[derive(Debug, Deserialize)]
struct UsageSample {
    current: f64,
}

static CPU_USAGE: MetricDesc = MetricDesc::gauge(
    "fortigate_cpu_usage_ratio",
    "Current global CPU usage (0-1)",
    &[],
);
static MEMORY_USAGE: MetricDesc = MetricDesc::gauge(
    "fortigate_memory_usage_ratio",
    "Current global memory usage (0-1)",
    &[],
);
static DISK_USAGE: MetricDesc = MetricDesc::gauge(
    "fortigate_disk_usage_ratio",
    "Current log disk usage (0-1)",
    &[],
);
static CURRENT_SESSIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_current_sessions",
    "Number of active sessions",
    &["protocol"],
);

/// `system_resources`: global CPU, memory, disk and session usage.
pub fn resources(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let usage: Envelope<ResourceUsage> =
        ctx.fetch_as(RESOURCE_USAGE_PATH, RESOURCE_USAGE_QUERY)?;
    let usage = usage.results;

    let mut out = Vec::new();
    if let Some(cpu) = usage.cpu.first() {
        out.push(CPU_USAGE.emit(percent_to_ratio(cpu.current), &[]));
    }
    if let Some(mem) = usage.mem.first() {
        out.push(MEMORY_USAGE.emit(percent_to_ratio(mem.current), &[]));
    }
    if let Some(disk) = usage.disk.first() {
        out.push(DISK_USAGE.emit(percent_to_ratio(disk.current), &[]));
    }
    if let Some(session) = usage.session.first() {
        out.push(CURRENT_SESSIONS.emit(session.current, &["ipv4"]));
    }
    if let Some(session) = usage.session6.first() {
        out.push(CURRENT_SESSIONS.emit(session.current, &["ipv6"]));
    }
    Ok(out)
}

/// Scalar part of a `monitor/system/vdom-resource` result.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VdomUsage {
    cpu: f64,
    memory: f64,
    setup_rate: f64,
    id: u64,
    deletable: bool,
}

impl FixedFields for VdomUsage {
    const FIELDS: &'static [&'static str] = &["cpu", "memory", "setup_rate", "id", "deletable"];
}

/// Usage of one object type (sessions, IPsec tunnels, addresses...).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectUsage {
    current_usage: f64,
    usage_percent: f64,
    custom_max: f64,
    guaranteed: f64,
}

static VDOM_CPU: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_cpu_usage_ratio",
    "Current VDOM CPU usage (0-1)",
    &["vdom"],
);
static VDOM_MEMORY: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_memory_usage_ratio",
    "Current VDOM memory usage (0-1)",
    &["vdom"],
);
static VDOM_SETUP_RATE: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_setup_rate",
    "Current VDOM session setup rate per second",
    &["vdom"],
);
static VDOM_OBJECT_USED: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_object_used",
    "Number of objects of a type used by the VDOM",
    &["vdom", "object"],
);
static VDOM_OBJECT_USAGE: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_object_usage_ratio",
    "Object usage relative to the VDOM quota (0-1)",
    &["vdom", "object"],
);
static VDOM_OBJECT_MAX: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_object_max",
    "Configured object quota for the VDOM, 0 when unlimited",
    &["vdom", "object"],
);
static VDOM_OBJECT_GUARANTEED: MetricDesc = MetricDesc::gauge(
    "fortigate_vdom_resource_object_guaranteed",
    "Guaranteed object count for the VDOM",
    &["vdom", "object"],
);

/// `system_vdom_resources`: per-VDOM usage with one entry per object type.
pub fn vdom_resources(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let envelopes: Vec<Envelope<Value>> = ctx.fetch_as(VDOM_RESOURCE_PATH, VDOM_ALL)?;

    let mut out = Vec::new();
    for envelope in envelopes {
        let vdom = envelope.vdom;
        let record: DynamicRecord<VdomUsage, ObjectUsage> =
            decode(envelope.results, VdomUsage::FIELDS)
                .map_err(|e| ProbeError::schema(VDOM_RESOURCE_PATH, e))?;

        let usage = &record.fixed;
        out.push(VDOM_CPU.emit(percent_to_ratio(usage.cpu), &[&vdom]));
        out.push(VDOM_MEMORY.emit(percent_to_ratio(usage.memory), &[&vdom]));
        out.push(VDOM_SETUP_RATE.emit(usage.setup_rate, &[&vdom]));

        for (object, entry) in &record.dynamic {
            let labels = [vdom.as_str(), object.as_str()];
            out.push(VDOM_OBJECT_USED.emit(entry.current_usage, &labels));
            out.push(VDOM_OBJECT_USAGE.emit(percent_to_ratio(entry.usage_percent), &labels));
            out.push(VDOM_OBJECT_MAX.emit(entry.custom_max, &labels));
            out.push(VDOM_OBJECT_GUARANTEED.emit(entry.guaranteed, &labels));
        }
    }
    Ok(out)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HaMember {
    hostname: String,
    serial_no: String,
    sessions: f64,
    cpu_usage: f64,
    mem_usage: f64,
    net_usage: f64,
    tpacket: f64,
    tbyte: f64,
    intrusion_detected: f64,
}

const HA_LABELS: &[&str] = &["hostname", "serial"];

static HA_MEMBER_INFO: MetricDesc = MetricDesc::gauge(
    "fortigate_ha_member_info",
    "Info metric regarding cluster members",
    HA_LABELS,
);
static HA_MEMBER_SESSIONS: MetricDesc = MetricDesc::gauge(
    "fortigate_ha_member_sessions",
    "Sessions handled by the cluster member",
    HA_LABELS,
);
static HA_MEMBER_CPU: MetricDesc = MetricDesc::gauge(
    "fortigate_ha_member_cpu_usage_ratio",
    "CPU usage of the cluster member (0-1)",
    HA_LABELS,
);
static HA_MEMBER_MEMORY: MetricDesc = MetricDesc::gauge(
    "fortigate_ha_member_memory_usage_ratio",
    "Memory usage of the cluster member (0-1)",
    HA_LABELS,
);
static HA_MEMBER_NETWORK: MetricDesc = MetricDesc::gauge(
    "fortigate_ha_member_network_usage_ratio",
    "Network usage of the cluster member (0-1)",
    HA_LABELS,
);
static HA_MEMBER_PACKETS: MetricDesc = MetricDesc::counter(
    "fortigate_ha_member_packets_total",
    "Packets processed by the cluster member",
    HA_LABELS,
);
static HA_MEMBER_BYTES: MetricDesc = MetricDesc::counter(
    "fortigate_ha_member_bytes_total",
    "Bytes processed by the cluster member",
    HA_LABELS,
);
static HA_MEMBER_IPS_EVENTS: MetricDesc = MetricDesc::counter(
    "fortigate_ha_member_ips_events_total",
    "IPS events detected by the cluster member",
    HA_LABELS,
);

/// `system_ha_statistics`: one set of gauges per cluster member.
pub fn ha_statistics(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let stats: Envelope<Vec<HaMember>> = ctx.fetch_as(HA_STATISTICS_PATH, "")?;

    let mut out = Vec::new();
    for member in &stats.results {
        let labels = [member.hostname.as_str(), member.serial_no.as_str()];
        out.push(HA_MEMBER_INFO.emit(1.0, &labels));
        out.push(HA_MEMBER_SESSIONS.emit(member.sessions, &labels));
        out.push(HA_MEMBER_CPU.emit(percent_to_ratio(member.cpu_usage), &labels));
        out.push(HA_MEMBER_MEMORY.emit(percent_to_ratio(member.mem_usage), &labels));
        out.push(HA_MEMBER_NETWORK.emit(percent_to_ratio(member.net_usage), &labels));
        out.push(HA_MEMBER_PACKETS.emit(member.tpacket, &labels));
        out.push(HA_MEMBER_BYTES.emit(member.tbyte, &labels));
        out.push(HA_MEMBER_IPS_EVENTS.emit(member.intrusion_detected, &labels));
    }
    Ok(out)
}
