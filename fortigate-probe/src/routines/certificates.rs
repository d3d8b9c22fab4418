use serde::Deserialize;

use crate::error::Result;
use crate::fanout::emit_states;
use crate::fetch::Envelope;
use crate::metric::{MetricDesc, MetricRecord};
use crate::scrape::ScrapeContext;

const CERTIFICATES_PATH: &str = "monitor/system/available-certificates";
const CERTIFICATES_QUERY: &str = "scope=global";

const VALIDITY_STATES: &[&str] = &["valid", "expired", "pending"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Certificate {
    name: String,
    source: String,
    #[serde(rename = "type")]
    kind: String,
    status: String,
    /// Unix seconds.
    valid_from: Option<f64>,
    valid_to: Option<f64>,
}

const LABELS: &[&str] = &["name", "source", "type"];

static VALIDITY: MetricDesc = MetricDesc::gauge(
    "fortigate_certificate_status",
    "Validity state of the certificate",
    &["name", "source", "type", "state"],
);
static NOT_BEFORE: MetricDesc = MetricDesc::gauge(
    "fortigate_certificate_valid_from_seconds",
    "Unix time from which the certificate is valid",
    LABELS,
);
static NOT_AFTER: MetricDesc = MetricDesc::gauge(
    "fortigate_certificate_valid_to_seconds",
    "Unix time at which the certificate expires",
    LABELS,
);

/// `certificates`: validity window and state of every installed certificate.
pub fn collect(ctx: &ScrapeContext<'_>) -> Result<Vec<MetricRecord>> {
    let certificates: Envelope<Vec<Certificate>> =
        ctx.fetch_as(CERTIFICATES_PATH, CERTIFICATES_QUERY)?;

    let mut out = Vec::new();
    for cert in &certificates.results {
        let labels = [cert.name.as_str(), cert.source.as_str(), cert.kind.as_str()];
        emit_states(&VALIDITY, &labels, &cert.status, VALIDITY_STATES, &mut out);
        if let Some(from) = cert.valid_from {
            out.push(NOT_BEFORE.emit(from, &labels));
        }
        if let Some(to) = cert.valid_to {
            out.push(NOT_AFTER.emit(to, &labels));
        }
    }
    Ok(out)
}
