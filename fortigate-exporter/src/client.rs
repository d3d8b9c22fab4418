//! Blocking FortiOS REST API client.

use std::time::{Duration, Instant};

use fortigate_probe::{Fetch, FetchError};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::TargetConfig;

/// [`Fetch`] over HTTPS with bearer-token authentication.
///
/// Every request shares one probe deadline: its timeout is whatever is left
/// of the deadline, capped by the per-request timeout.
pub struct FortiClient {
    http: Client,
    base_url: String,
    token: String,
    request_timeout: Duration,
    deadline: Instant,
}

impl FortiClient {
    /// Create a client for `base_url` (scheme and host, no trailing slash).
    pub fn new(
        base_url: &str,
        target: &TargetConfig,
        request_timeout: Duration,
        deadline: Instant,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .danger_accept_invalid_certs(target.insecure)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            token: target.token.clone(),
            request_timeout,
            deadline,
        })
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/api/v2/{}", self.base_url, path)
        } else {
            format!("{}/api/v2/{}?{}", self.base_url, path, query)
        }
    }
}

impl Fetch for FortiClient {
    fn fetch(&self, path: &str, query: &str) -> Result<Value, FetchError> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(FetchError::timeout(path));
        }

        let url = self.url(path, query);
        tracing::trace!(url = %url, "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .timeout(remaining.min(self.request_timeout))
            .send()
            .map_err(|e| request_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| request_error(path, e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::MalformedJson {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

fn request_error(path: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(path)
    } else {
        FetchError::transport(path, error.to_string())
    }
}
