//! Collection routine harness.

use glob::{Pattern, PatternError};

use crate::error::{ProbeError, Result};
use crate::metric::{CollectionResult, MetricRecord};
use crate::scrape::ScrapeContext;
use crate::version::MinVersion;

/// Body of a collection routine.
pub type CollectFn = fn(&ScrapeContext<'_>) -> Result<Vec<MetricRecord>>;

/// A named collection routine with an optional firmware requirement.
#[derive(Debug)]
pub struct Routine {
    pub name: &'static str,
    pub since: Option<MinVersion>,
    collect: CollectFn,
}

/// What happened when a routine ran.
#[derive(Debug)]
pub enum RoutineOutcome {
    /// The routine fetched and decoded its data.
    Collected(Vec<MetricRecord>),
    /// The target firmware does not support the routine.
    Skipped,
    /// A fetch or decode failure aborted the routine.
    Failed(ProbeError),
}

impl RoutineOutcome {
    /// Whether this outcome counts as success for the scrape.
    pub fn is_ok(&self) -> bool {
        !matches!(self, RoutineOutcome::Failed(_))
    }

    /// Short label for logs and self-monitoring.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutineOutcome::Collected(_) => "collected",
            RoutineOutcome::Skipped => "skipped",
            RoutineOutcome::Failed(_) => "failed",
        }
    }
}

impl From<RoutineOutcome> for CollectionResult {
    fn from(outcome: RoutineOutcome) -> Self {
        match outcome {
            RoutineOutcome::Collected(metrics) => CollectionResult::collected(metrics),
            RoutineOutcome::Skipped => CollectionResult::skipped(),
            RoutineOutcome::Failed(_) => CollectionResult::failed(),
        }
    }
}

impl Routine {
    /// Declare a routine available on every firmware.
    pub const fn new(name: &'static str, collect: CollectFn) -> Self {
        Self {
            name,
            since: None,
            collect,
        }
    }

    /// Require at least firmware `major.minor`.
    pub const fn since(mut self, major: u32, minor: u32) -> Self {
        self.since = Some(MinVersion::new(major, minor));
        self
    }

    /// Run the routine against a scrape context.
    ///
    /// The version gate is evaluated before any fetch is issued.
    pub fn run(&self, ctx: &ScrapeContext<'_>) -> RoutineOutcome {
        if let Some(min) = self.since {
            let supported = ctx.metadata().is_some_and(|m| m.satisfies(min));
            if !supported {
                tracing::debug!(
                    parent: ctx.span(),
                    routine = self.name,
                    required = %min,
                    "Routine not supported by target firmware, skipping"
                );
                return RoutineOutcome::Skipped;
            }
        }

        match (self.collect)(ctx) {
            Ok(metrics) => RoutineOutcome::Collected(metrics),
            Err(e) => {
                tracing::warn!(
                    parent: ctx.span(),
                    routine = self.name,
                    error = %e,
                    "Routine failed"
                );
                RoutineOutcome::Failed(e)
            }
        }
    }
}

/// Selects routines by name with glob patterns.
#[derive(Debug, Clone, Default)]
pub struct RoutineFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl RoutineFilter {
    /// Compile include and exclude patterns. An empty include list selects
    /// every routine.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> std::result::Result<Self, PatternError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Check if a routine should run.
    pub fn allows(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(name)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(name))
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> std::result::Result<Vec<Pattern>, PatternError> {
    patterns.iter().map(|p| Pattern::new(p.as_ref())).collect()
}
