//! Error types for the probe engine.

use thiserror::Error;

/// Result type alias using [`ProbeError`].
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors reported by a [`Fetch`](crate::Fetch) implementation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered with a non-success HTTP status.
    #[error("{path}: unexpected HTTP status {status}")]
    Status { path: String, status: u16 },

    /// The request could not be sent or the response could not be read.
    #[error("{path}: transport error: {message}")]
    Transport { path: String, message: String },

    /// The scrape deadline expired before or during the request.
    #[error("{path}: scrape deadline exceeded")]
    Timeout { path: String },

    /// The response body is not valid JSON.
    #[error("{path}: malformed JSON response: {message}")]
    MalformedJson { path: String, message: String },
}

impl FetchError {
    /// Create a transport error.
    pub fn transport(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a deadline error.
    pub fn timeout(path: impl Into<String>) -> Self {
        Self::Timeout { path: path.into() }
    }
}

/// Errors raised while splitting an object into fixed and dynamic parts.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input value is not a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// A known field does not have the expected type.
    #[error("fixed fields: {0}")]
    FixedField(#[source] serde_json::Error),

    /// A dynamically keyed entry does not match the sub-record shape.
    #[error("dynamic entry '{key}': {source}")]
    DynamicEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that abort a single collection routine.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Fetching an endpoint failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The response does not match the expected shape.
    #[error("{path}: unexpected response shape: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A mixed fixed/dynamic object could not be split.
    #[error("{path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: DecodeError,
    },

    /// Data the routine depends on was not obtained earlier in the scrape.
    #[error("{0} unavailable")]
    Unavailable(&'static str),
}

impl ProbeError {
    /// Wrap a serde error for the given endpoint.
    pub fn decode(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    /// Wrap a schema split error for the given endpoint.
    pub fn schema(path: impl Into<String>, source: DecodeError) -> Self {
        Self::Schema {
            path: path.into(),
            source,
        }
    }
}
