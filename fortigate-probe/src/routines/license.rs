//! License and entitlement status.
//!
//! `results` holds two fixed sections (`vdom`, `forticare`) next to one
//! entry per FortiGuard entitlement, whose names vary with the model and
//! subscriptions.

use serde::Deserialize;

use crate::decode::{DynamicRecord, FixedFields};
use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::scrape::ScrapeContext;

const LICENSE_STATUS_PATH: &str = "monitor/license/status";

const ENTITLEMENT_STATES: &[&str] = &["licensed", "expired", "no_license", "pending"];
const FORTICARE_STATES: &[&str] = &["registered", "unregistered", "pending"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixed {
    vdom: VdomLicense,
    forticare: ForticareLicense,
}

impl FixedFields for Fixed {
    const FIELDS: &'static [&'static str] = &["vdom", "forticare"];
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VdomLicense {
    used: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ForticareLicense {
    registration_status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entitlement {
    status: String,
    /// Unix seconds.
    expires: Option<f64>,
}

static VDOM_USED: MetricDesc = MetricDesc::gauge(
    "fortigate_license_vdom_usage",
    "The amount of VDOM licenses currently used",
    &[],
);
static VDOM_MAX: MetricDesc = MetricDesc::gauge(
    "fortigate_license_vdom_max",
    "The total amount of VDOM licenses available",
    &[],
);
static FORTICARE: MetricDesc = MetricDesc::gauge(
    "fortigate_license_forticare_registration_status",
    "FortiCare registration state of the device",
    &["state"],
);
static ENTITLEMENT_STATUS: MetricDesc = MetricDesc::gauge(
    "fortigate_license_status",
    "State of a FortiGuard entitlement",
    &["entitlement", "state"],
);
static ENTITLEMENT_EXPIRY: MetricDesc = MetricDesc::gauge(
    "fortigate_license_expiry_timestamp_seconds",
    "Unix time at which the entitlement expires",
    &["entitlement"],
);

/// `license_status`: VDOM license usage, FortiCare registration and every
/// entitlement's state.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let status: Envelope<DynamicRecord<Fixed, Entitlement>> =
        ctx.fetch_as(LICENSE_STATUS_PATH, "")?;
    let license = status.results;

    let mut out = Vec::new();
    if let Some(used) = license.fixed.vdom.used {
        out.push(VDOM_USED.emit(used, &[]));
    }
    if let Some(max) = license.fixed.vdom.max {
        out.push(VDOM_MAX.emit(max, &[]));
    }
    emit_states(
        &FORTICARE,
        &[],
        &license.fixed.forticare.registration_status,
        FORTICARE_STATES,
        &mut out,
    );

    for (name, entitlement) in &license.dynamic {
        emit_states(
            &ENTITLEMENT_STATUS,
            &[name.as_str()],
            &entitlement.status,
            ENTITLEMENT_STATES,
            &mut out,
        );
        if let Some(expires) = entitlement.expires {
            out.push(ENTITLEMENT_EXPIRY.emit(expires, &[name.as_str()]));
        }
    }
    Ok(out)
}
