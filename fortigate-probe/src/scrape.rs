//! Runs the routine table against one target.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tracing::Span;

use crate::error::Result;
use crate::fetch::{Envelope, Fetch, fetch_as};
use crate::metric::MetricRecord;
use crate::routine::{Routine, RoutineFilter, RoutineOutcome};
use crate::routines::ROUTINES;
use crate::routines::system::{STATUS_PATH, SystemStatus};
use crate::version::{ApiPolicy, TargetMetadata};

/// Default page size for BGP path listings.
pub const DEFAULT_MAX_BGP_PATHS: usize = 10_000;

/// Per-target scrape settings.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Page size requested from the BGP path endpoints.
    pub max_bgp_paths: usize,
    /// Routines enabled for this target.
    pub routines: RoutineFilter,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            max_bgp_paths: DEFAULT_MAX_BGP_PATHS,
            routines: RoutineFilter::default(),
        }
    }
}

/// Everything a routine may consult during one scrape.
///
/// Built once per scrape and never mutated afterwards.
pub struct ScrapeContext<'a> {
    fetch: &'a dyn Fetch,
    metadata: Option<TargetMetadata>,
    policy: ApiPolicy,
    status: Option<Envelope<SystemStatus>>,
    options: &'a ProbeOptions,
    span: Span,
}

impl<'a> ScrapeContext<'a> {
    /// Create a context from already resolved identity data.
    pub fn new(
        fetch: &'a dyn Fetch,
        metadata: Option<TargetMetadata>,
        status: Option<Envelope<SystemStatus>>,
        options: &'a ProbeOptions,
        span: Span,
    ) -> Self {
        Self {
            fetch,
            policy: ApiPolicy::resolve(metadata.as_ref()),
            metadata,
            status,
            options,
            span,
        }
    }

    /// Fetch the system status, derive the firmware metadata and build the context.
    pub fn resolve(fetch: &'a dyn Fetch, options: &'a ProbeOptions, span: Span) -> Self {
        let status: Option<Envelope<SystemStatus>> = match fetch_as(fetch, STATUS_PATH, "") {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(parent: &span, error = %e, "Failed to resolve target identity");
                None
            }
        };

        let version = status.as_ref().and_then(|s| s.version.as_deref());
        let metadata = version.and_then(TargetMetadata::parse);
        match (version, metadata) {
            (Some(version), None) => {
                tracing::warn!(parent: &span, version, "Unrecognized firmware version string");
            }
            (_, Some(metadata)) => {
                tracing::debug!(parent: &span, firmware = %metadata, "Resolved target firmware");
            }
            _ => {}
        }

        Self::new(fetch, metadata, status, options, span)
    }

    /// Fetch an endpoint and deserialize it.
    pub fn fetch_as<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<T> {
        fetch_as(self.fetch, path, query)
    }

    /// Firmware metadata, `None` when unknown.
    pub fn metadata(&self) -> Option<&TargetMetadata> {
        self.metadata.as_ref()
    }

    /// Endpoint choices for this scrape.
    pub fn policy(&self) -> ApiPolicy {
        self.policy
    }

    /// System status fetched during identity resolution.
    pub fn status(&self) -> Option<&Envelope<SystemStatus>> {
        self.status.as_ref()
    }

    /// Scrape settings.
    pub fn options(&self) -> &ProbeOptions {
        self.options
    }

    /// Diagnostics span every routine event is attached to.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Per-routine diagnostic entry.
#[derive(Debug)]
pub struct RoutineReport {
    pub name: &'static str,
    pub outcome: &'static str,
    pub ok: bool,
    pub metrics: usize,
    pub elapsed: Duration,
}

/// Result of a full scrape.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// Metrics of every routine, in routine order.
    pub metrics: Vec<MetricRecord>,
    /// Logical AND of every routine's success flag.
    pub ok: bool,
    /// Diagnostics per routine that ran.
    pub routines: Vec<RoutineReport>,
    /// Firmware metadata, when it could be resolved.
    pub metadata: Option<TargetMetadata>,
}

/// Scrape one target with the default routine table.
pub fn scrape(fetch: &dyn Fetch, options: &ProbeOptions, span: Span) -> ScrapeReport {
    scrape_with(fetch, options, span, ROUTINES)
}

/// Scrape one target with an explicit routine table.
///
/// Routines run one at a time in table order. A failing routine does not
/// stop the ones after it.
pub fn scrape_with(
    fetch: &dyn Fetch,
    options: &ProbeOptions,
    span: Span,
    routines: &[Routine],
) -> ScrapeReport {
    let ctx = ScrapeContext::resolve(fetch, options, span);
    let mut report = ScrapeReport {
        ok: true,
        metadata: ctx.metadata().copied(),
        ..Default::default()
    };

    for routine in routines.iter().filter(|r| options.routines.allows(r.name)) {
        let started = Instant::now();
        let outcome = routine.run(&ctx);
        let elapsed = started.elapsed();

        let ok = outcome.is_ok();
        let label = outcome.as_str();
        let count = match outcome {
            RoutineOutcome::Collected(metrics) => {
                let count = metrics.len();
                report.metrics.extend(metrics);
                count
            }
            RoutineOutcome::Skipped | RoutineOutcome::Failed(_) => 0,
        };

        tracing::trace!(
            parent: ctx.span(),
            routine = routine.name,
            outcome = label,
            metrics = count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Routine finished"
        );

        report.ok &= ok;
        report.routines.push(RoutineReport {
            name: routine.name,
            outcome: label,
            ok,
            metrics: count,
            elapsed,
        });
    }

    tracing::debug!(
        parent: ctx.span(),
        ok = report.ok,
        metrics = report.metrics.len(),
        routines = report.routines.len(),
        "Scrape finished"
    );

    report
}
