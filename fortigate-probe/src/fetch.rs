//! The fetch capability and FortiOS response envelopes.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FetchError, ProbeError, Result};

/// Capability to GET one API endpoint and return its JSON body.
///
/// `path` is relative to `/api/v2/` (e.g. `monitor/system/status`) and
/// `query` is an already encoded query string without the leading `?`.
/// Implementations must fail for non-success statuses and malformed JSON.
pub trait Fetch {
    fn fetch(&self, path: &str, query: &str) -> std::result::Result<Value, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, path: &str, query: &str) -> std::result::Result<Value, FetchError> {
        (**self).fetch(path, query)
    }
}

/// Fetch an endpoint and deserialize the body into `T`.
pub fn fetch_as<T: DeserializeOwned>(fetch: &dyn Fetch, path: &str, query: &str) -> Result<T> {
    let value = fetch.fetch(path, query)?;
    serde_json::from_value(value).map_err(|source| ProbeError::decode(path, source))
}

/// Standard FortiOS response wrapper.
///
/// Endpoints queried with `vdom=*` return an array of envelopes, one per
/// VDOM; global endpoints return a single envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Endpoint payload.
    pub results: T,

    /// VDOM the payload belongs to.
    #[serde(default)]
    pub vdom: String,

    /// Firmware version string, e.g. `v7.0.12`.
    #[serde(default)]
    pub version: Option<String>,

    /// Device serial number.
    #[serde(default)]
    pub serial: Option<String>,

    /// Firmware build number.
    #[serde(default)]
    pub build: Option<u64>,
}
