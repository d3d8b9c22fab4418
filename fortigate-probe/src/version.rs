//! Firmware version parsing, routine gating and endpoint policy.

use std::fmt;

/// Firmware identity of the scraped device, resolved once per scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMetadata {
    pub version_major: u32,
    pub version_minor: u32,
}

impl TargetMetadata {
    /// Parse a FortiOS version string such as `v7.0.12`.
    ///
    /// Only the `v<major>.<minor>.` prefix is inspected. Anything else yields
    /// `None`, meaning "version unknown".
    pub fn parse(version: &str) -> Option<Self> {
        let rest = version.strip_prefix('v')?;
        let (major, rest) = rest.split_once('.')?;
        let (minor, _) = rest.split_once('.')?;

        Some(Self {
            version_major: parse_component(major)?,
            version_minor: parse_component(minor)?,
        })
    }

    /// Check whether this firmware is at least `min`.
    pub fn satisfies(&self, min: MinVersion) -> bool {
        self.version_major > min.major
            || (self.version_major == min.major && self.version_minor >= min.minor)
    }
}

impl fmt::Display for TargetMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.version_major, self.version_minor)
    }
}

fn parse_component(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Minimum firmware requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinVersion {
    pub major: u32,
    pub minor: u32,
}

impl MinVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for MinVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Decide whether a routine requiring `min_major.min_minor` applies.
///
/// Unknown metadata never satisfies a requirement.
pub fn applies(metadata: Option<&TargetMetadata>, min_major: u32, min_minor: u32) -> bool {
    metadata.is_some_and(|m| m.satisfies(MinVersion::new(min_major, min_minor)))
}

/// Firmware from which IPv4 and IPv6 policy statistics share one endpoint.
pub const COMBINED_POLICY_SINCE: MinVersion = MinVersion::new(6, 4);

/// Version-dependent endpoint choices, resolved once per scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiPolicy {
    /// Query IPv4 and IPv6 policy statistics from `monitor/firewall/policy/select`
    /// with an `ip_version` parameter, and read both families' configuration
    /// from `cmdb/firewall/policy`.
    pub combined_policy_stats: bool,
}

impl ApiPolicy {
    /// Resolve the policy for a target. Unknown firmware uses the legacy
    /// per-family endpoints.
    pub fn resolve(metadata: Option<&TargetMetadata>) -> Self {
        Self {
            combined_policy_stats: metadata.is_some_and(|m| m.satisfies(COMBINED_POLICY_SINCE)),
        }
    }
}
