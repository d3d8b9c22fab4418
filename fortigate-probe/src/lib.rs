//! FortiGate Probe Library
//!
//! Turns FortiOS REST monitoring API responses into flat, labeled metric
//! records. The crate knows nothing about HTTP or Prometheus exposition: it
//! consumes a [`Fetch`] capability and produces [`MetricRecord`]s.
//!
//! - [`version`] - Firmware version parsing, gating and the per-scrape [`ApiPolicy`]
//! - [`decode`] - Objects mixing fixed fields with dynamically keyed sub-records
//! - [`correlate`] - Joining result sets fetched from independent endpoints
//! - [`fanout`] - Categorical state strings to mutually exclusive indicators
//! - [`convert`] - Unit conversions shared by the routines
//! - [`routines`] - One collection routine per monitored resource type
//! - [`scrape`] - Runs the routine table against one target
//!
//! # Example
//!
//! ```ignore
//! use fortigate_probe::{ProbeOptions, scrape};
//!
//! let report = scrape(&client, &ProbeOptions::default(), tracing::info_span!("probe"));
//! for metric in &report.metrics {
//!     println!("{} {}", metric.name, metric.value);
//! }
//! ```

pub mod convert;
pub mod correlate;
pub mod decode;
pub mod error;
pub mod fanout;
pub mod fetch;
pub mod metric;
pub mod mock;
pub mod routine;
pub mod routines;
pub mod scrape;
pub mod version;

// Re-export commonly used types at the crate root
pub use decode::{DynamicRecord, FixedFields};
pub use error::{DecodeError, FetchError, ProbeError, Result};
pub use fetch::{Envelope, Fetch, fetch_as};
pub use metric::{CollectionResult, MetricDesc, MetricKind, MetricRecord};
pub use mock::StaticFetch;
pub use routine::{Routine, RoutineFilter, RoutineOutcome};
pub use routines::ROUTINES;
pub use scrape::{ProbeOptions, RoutineReport, ScrapeContext, ScrapeReport, scrape};
pub use version::{ApiPolicy, MinVersion, TargetMetadata};
