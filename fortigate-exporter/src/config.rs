//! Configuration for the FortiGate exporter.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use fortigate_probe::{ProbeOptions, RoutineFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to initialize tracing: {0}")]
    Logging(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Scrape limits shared by every target.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Probed appliances, keyed by base URL.
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (default: "0.0.0.0:9710").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path of the probe endpoint (default: "/probe").
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Path of the exporter's own metrics (default: "/metrics").
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

fn default_listen() -> String {
    "0.0.0.0:9710".to_string()
}

fn default_probe_path() -> String {
    "/probe".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            probe_path: default_probe_path(),
            metrics_path: default_metrics_path(),
        }
    }
}

/// Scrape limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Deadline for a whole probe (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Upper bound for a single API request (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Page size requested from the BGP path endpoints.
    #[serde(default = "default_max_bgp_paths")]
    pub max_bgp_paths: usize,
}

fn default_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_bgp_paths() -> usize {
    fortigate_probe::scrape::DEFAULT_MAX_BGP_PATHS
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_bgp_paths: default_max_bgp_paths(),
        }
    }
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// One probed appliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// REST API administrator token.
    pub token: String,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,

    /// Routines to run against this target.
    #[serde(default)]
    pub routines: RoutineSelection,
}

/// Glob patterns over routine names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutineSelection {
    /// Routines to run (empty = all).
    #[serde(default)]
    pub include: Vec<String>,

    /// Routines never to run.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TargetConfig {
    /// Build the engine options for this target.
    pub fn probe_options(&self, scrape: &ScrapeConfig) -> Result<ProbeOptions, ConfigError> {
        let routines = RoutineFilter::new(&self.routines.include, &self.routines.exclude)
            .map_err(|e| ConfigError::Validation(format!("Invalid routine pattern: {}", e)))?;
        Ok(ProbeOptions {
            max_bgp_paths: scrape.max_bgp_paths,
            routines,
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Canonical form of a target URL: scheme defaults to `https://`, no
/// trailing slash.
pub fn normalize_target(target: &str) -> String {
    let target = target.trim().trim_end_matches('/');
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: ExporterConfig = json5::from_str(content)?;
        config.targets = config
            .targets
            .into_iter()
            .map(|(url, target)| (normalize_target(&url), target))
            .collect();
        config.validate()?;
        Ok(config)
    }

    /// Look up a target by URL, in any accepted spelling.
    pub fn target(&self, url: &str) -> Option<(String, &TargetConfig)> {
        let url = normalize_target(url);
        let target = self.targets.get(&url)?;
        Some((url, target))
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen.parse().map_err(|_| {
            ConfigError::Validation(format!("Invalid listen address: {}", self.server.listen))
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        for path in [&self.server.probe_path, &self.server.metrics_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "Path must start with /: {}",
                    path
                )));
            }
        }
        if self.server.probe_path == self.server.metrics_path {
            return Err(ConfigError::Validation(
                "probe_path and metrics_path must differ".to_string(),
            ));
        }
        if self.server.probe_path == "/health" || self.server.metrics_path == "/health" {
            return Err(ConfigError::Validation("/health is reserved".to_string()));
        }

        if self.scrape.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        if self.scrape.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.scrape.request_timeout_secs > self.scrape.timeout_secs {
            return Err(ConfigError::Validation(
                "request_timeout_secs must not exceed timeout_secs".to_string(),
            ));
        }
        if self.scrape.max_bgp_paths == 0 {
            return Err(ConfigError::Validation(
                "max_bgp_paths must be > 0".to_string(),
            ));
        }

        for (url, target) in &self.targets {
            if target.token.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Target {} has an empty token",
                    url
                )));
            }
            target.probe_options(&self.scrape)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = "{}";
        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:9710");
        assert_eq!(config.server.probe_path, "/probe");
        assert_eq!(config.server.metrics_path, "/metrics");
        assert_eq!(config.scrape.timeout_secs, 30);
        assert_eq!(config.scrape.request_timeout_secs, 10);
        assert_eq!(config.scrape.max_bgp_paths, 10_000);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            server: {
                listen: "127.0.0.1:9711",
                probe_path: "/fortigate/probe",
                metrics_path: "/fortigate/metrics"
            },
            scrape: {
                timeout_secs: 20,
                request_timeout_secs: 5,
                max_bgp_paths: 500
            },
            targets: {
                "https://fw01.example.net/": {
                    token: "s3cret",
                    insecure: true,
                    routines: { exclude: ["wifi_*", "switch_ports"] }
                },
                "fw02.example.net": { token: "other" }
            },
            logging: {
                level: "debug",
                format: "json"
            }
        }"#;

        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:9711");
        assert_eq!(config.server.probe_path, "/fortigate/probe");
        assert_eq!(config.scrape.timeout(), Duration::from_secs(20));
        assert_eq!(config.scrape.max_bgp_paths, 500);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        let (url, fw01) = config.target("fw01.example.net").unwrap();
        assert_eq!(url, "https://fw01.example.net");
        assert!(fw01.insecure);
        assert_eq!(fw01.routines.exclude, vec!["wifi_*", "switch_ports"]);

        let options = fw01.probe_options(&config.scrape).unwrap();
        assert_eq!(options.max_bgp_paths, 500);
        assert!(!options.routines.allows("wifi_managed_aps"));
        assert!(options.routines.allows("interfaces"));

        assert!(config.target("https://fw02.example.net/").is_some());
        assert!(config.target("fw03.example.net").is_none());
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("fw01"), "https://fw01");
        assert_eq!(normalize_target("https://fw01:8443/"), "https://fw01:8443");
        assert_eq!(normalize_target("http://10.0.0.1"), "http://10.0.0.1");
    }

    #[test]
    fn test_validate_invalid_listen() {
        let json = r#"{
            server: { listen: "not-an-address" }
        }"#;

        let result = ExporterConfig::parse(json);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid listen address")
        );
    }

    #[test]
    fn test_validate_invalid_path() {
        let json = r#"{
            server: { probe_path: "no-leading-slash" }
        }"#;

        let result = ExporterConfig::parse(json);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with /")
        );
    }

    #[test]
    fn test_validate_same_paths() {
        let json = r#"{
            server: { probe_path: "/metrics" }
        }"#;

        assert!(ExporterConfig::parse(json).is_err());
    }

    #[test]
    fn test_validate_timeouts() {
        assert!(ExporterConfig::parse("{ scrape: { timeout_secs: 0 } }").is_err());
        assert!(ExporterConfig::parse("{ scrape: { request_timeout_secs: 0 } }").is_err());
        assert!(
            ExporterConfig::parse("{ scrape: { timeout_secs: 5, request_timeout_secs: 10 } }")
                .is_err()
        );
        assert!(ExporterConfig::parse("{ scrape: { max_bgp_paths: 0 } }").is_err());
    }

    #[test]
    fn test_validate_empty_token() {
        let json = r#"{ targets: { "fw01": { token: "  " } } }"#;

        let result = ExporterConfig::parse(json);
        assert!(result.unwrap_err().to_string().contains("empty token"));
    }

    #[test]
    fn test_validate_bad_routine_pattern() {
        let json = r#"{ targets: { "fw01": { token: "t", routines: { include: ["[bgp"] } } } }"#;

        assert!(ExporterConfig::parse(json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exporter.json5");
        std::fs::write(
            &path,
            r#"{
                // comments are allowed
                targets: { "fw01.example.net": { token: "abc" } },
            }"#,
        )
        .unwrap();

        let config = ExporterConfig::load_from_file(&path).unwrap();
        assert!(config.target("fw01.example.net").is_some());
    }

    #[test]
    fn test_sample_config_parses() {
        let config =
            ExporterConfig::parse(include_str!("../../configs/fortigate-exporter.json5")).unwrap();

        assert_eq!(config.targets.len(), 2);
        let (url, target) = config.target("lab-fw.example.net:8443").unwrap();
        assert_eq!(url, "https://lab-fw.example.net:8443");
        assert!(target.insecure);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ExporterConfig::load_from_file("/nonexistent/exporter.json5");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
