//! Canned-response [`Fetch`] implementation.
//!
//! Serves recorded API responses keyed by path and query. Used by the test
//! suites and for replaying captured device output offline.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::error::FetchError;
use crate::fetch::Fetch;

enum Canned {
    Body(Value),
    Status(u16),
}

/// A [`Fetch`] double answering from a fixed table.
///
/// Unknown endpoints answer with HTTP 404. Every request is recorded and
/// can be inspected with [`StaticFetch::calls`].
#[derive(Default)]
pub struct StaticFetch {
    responses: HashMap<(String, String), Canned>,
    calls: RefCell<Vec<(String, String)>>,
}

impl StaticFetch {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a JSON body for `path` + `query`.
    pub fn with(mut self, path: &str, query: &str, body: Value) -> Self {
        self.responses
            .insert((path.to_string(), query.to_string()), Canned::Body(body));
        self
    }

    /// Register an HTTP error status for `path` + `query`.
    pub fn with_status(mut self, path: &str, query: &str, status: u16) -> Self {
        self.responses
            .insert((path.to_string(), query.to_string()), Canned::Status(status));
        self
    }

    /// Requests made so far, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }
}

impl Fetch for StaticFetch {
    fn fetch(&self, path: &str, query: &str) -> Result<Value, FetchError> {
        self.calls
            .borrow_mut()
            .push((path.to_string(), query.to_string()));

        match self.responses.get(&(path.to_string(), query.to_string())) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(FetchError::Status {
                path: path.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                path: path.to_string(),
                status: 404,
            }),
        }
    }
}
