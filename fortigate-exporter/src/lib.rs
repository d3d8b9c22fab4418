//! Prometheus exporter for FortiGate appliances.
//!
//! Each request to the probe endpoint scrapes one FortiGate through its REST
//! monitoring API and answers with the resulting metrics, in the style of the
//! Prometheus multi-target exporter pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  /probe?target=  ┌─────────────┐  /api/v2/...  ┌───────────┐
//! │ Prometheus │ ───────────────> │ HTTP server │ ────────────> │ FortiGate │
//! └────────────┘                  │  + probe    │  (blocking)   └───────────┘
//!                                 └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! fortigate-exporter --config fortigate-exporter.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod client;
pub mod config;
pub mod exposition;
pub mod http;
pub mod probe;
pub mod telemetry;

pub use client::FortiClient;
pub use config::{ConfigError, ExporterConfig, LogFormat, LoggingConfig};
pub use http::HttpServer;
pub use telemetry::{ExporterMetrics, SharedMetrics};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| ConfigError::Logging(e.to_string()))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| ConfigError::Logging(e.to_string()))?;
        }
    }

    Ok(())
}
