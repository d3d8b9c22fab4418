//! Runs one probe on the blocking pool under a deadline.

use std::time::{Duration, Instant};

use fortigate_probe::{MetricRecord, ProbeOptions, scrape};
use tracing::Instrument;

use crate::client::FortiClient;
use crate::config::{ScrapeConfig, TargetConfig};
use crate::telemetry::{ExporterMetrics, ProbeOutcome};

/// Extra time granted to the blocking task after the deadline, so that a
/// request cut short by its own timeout can still report.
const JOIN_GRACE: Duration = Duration::from_secs(1);

/// Result of one probe.
#[derive(Debug)]
pub struct ProbeResult {
    pub metrics: Vec<MetricRecord>,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn success(&self) -> bool {
        self.outcome == ProbeOutcome::Success
    }
}

/// Probe `url` with the given settings.
///
/// The scrape itself is synchronous and runs on the blocking pool. The HTTP
/// client is created and dropped there too.
pub async fn run_probe(
    url: String,
    target: TargetConfig,
    options: ProbeOptions,
    scrape_config: &ScrapeConfig,
    metrics: &ExporterMetrics,
) -> ProbeResult {
    let _in_flight = metrics.start_probe();
    let started = Instant::now();
    let deadline = started + scrape_config.timeout();
    let request_timeout = scrape_config.request_timeout();

    let span = tracing::info_span!("probe", target = %url);
    let task_span = span.clone();
    let task = tokio::task::spawn_blocking(move || {
        let client = FortiClient::new(&url, &target, request_timeout, deadline)?;
        Ok::<_, reqwest::Error>(scrape(&client, &options, task_span))
    });

    let joined = tokio::time::timeout(scrape_config.timeout() + JOIN_GRACE, task)
        .instrument(span.clone())
        .await;
    let elapsed = started.elapsed();

    let (metrics_out, outcome) = match joined {
        Ok(Ok(Ok(report))) => {
            for routine in report.routines.iter().filter(|r| !r.ok) {
                metrics.routine_failed(routine.name);
            }
            let outcome = if report.ok {
                ProbeOutcome::Success
            } else if Instant::now() >= deadline {
                ProbeOutcome::Timeout
            } else {
                ProbeOutcome::Failure
            };
            (report.metrics, outcome)
        }
        Ok(Ok(Err(e))) => {
            tracing::error!(parent: &span, error = %e, "Failed to create HTTP client");
            (Vec::new(), ProbeOutcome::Failure)
        }
        Ok(Err(e)) => {
            tracing::error!(parent: &span, error = %e, "Probe task failed");
            (Vec::new(), ProbeOutcome::Failure)
        }
        Err(_) => {
            tracing::warn!(parent: &span, timeout_secs = scrape_config.timeout_secs, "Probe timed out");
            (Vec::new(), ProbeOutcome::Timeout)
        }
    };

    metrics.observe_probe(outcome, elapsed.as_secs_f64());
    tracing::info!(
        parent: &span,
        outcome = ?outcome,
        metrics = metrics_out.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Probe finished"
    );

    ProbeResult {
        metrics: metrics_out,
        outcome,
        elapsed,
    }
}
