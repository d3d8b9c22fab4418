//! Joining result sets fetched from independent endpoints.
//!
//! FortiOS splits related data across endpoints: firewall policy counters
//! come from `monitor/firewall/policy/select` while policy names live in
//! `cmdb/firewall/policy`. The two are joined on the policy UUID.
//!
//! # Example
//!
//! ```
//! use fortigate_probe::correlate::{CorrelationIndex, correlate, correlation_label};
//!
//! struct Stats { id: u64, uuid: String }
//! struct Config { uuid: String, name: String }
//!
//! let configs = vec![Config { uuid: "a".into(), name: "allow-lan".into() }];
//! let stats = vec![Stats { id: 1, uuid: "a".into() }, Stats { id: 0, uuid: String::new() }];
//!
//! let index = CorrelationIndex::build(&configs, |c| c.uuid.as_str());
//! let labels: Vec<&str> = correlate(&stats, &index, |s| s.uuid.as_str())
//!     .into_iter()
//!     .map(|(s, c)| correlation_label(s.id, c.map(|c| c.name.as_str())))
//!     .collect();
//!
//! assert_eq!(labels, vec!["allow-lan", "Implicit Deny"]);
//! ```

use std::collections::HashMap;

/// Label used for the implicit catch-all record (numeric id 0).
pub const IMPLICIT_DENY: &str = "Implicit Deny";

/// Label used when a record has no counterpart in the secondary set.
pub const UNKNOWN_LABEL: &str = "<UNKNOWN>";

/// Lookup from join key to secondary record, built once per correlation.
#[derive(Debug)]
pub struct CorrelationIndex<'a, S> {
    by_key: HashMap<&'a str, &'a S>,
}

impl<'a, S> CorrelationIndex<'a, S> {
    /// Index `items` by `key_of`.
    ///
    /// Keys are expected to be unique; on duplicates the last item wins.
    pub fn build<K>(items: &'a [S], key_of: K) -> Self
    where
        K: Fn(&'a S) -> &'a str,
    {
        let mut by_key = HashMap::with_capacity(items.len());
        for item in items {
            let key = key_of(item);
            if by_key.insert(key, item).is_some() {
                tracing::debug!(key, "Duplicate correlation key, keeping the last record");
            }
        }
        Self { by_key }
    }

    /// Look up a secondary record.
    pub fn get(&self, key: &str) -> Option<&'a S> {
        self.by_key.get(key).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Pair every primary record with its secondary counterpart, if any.
///
/// Output order follows `primary`.
pub fn correlate<'p, 's, P, S, K>(
    primary: &'p [P],
    index: &CorrelationIndex<'s, S>,
    key_of: K,
) -> Vec<(&'p P, Option<&'s S>)>
where
    K: Fn(&P) -> &str,
{
    primary
        .iter()
        .map(|item| (item, index.get(key_of(item))))
        .collect()
}

/// Resolve the display label of a correlated record.
///
/// Id 0 is the implicit default record and is labeled [`IMPLICIT_DENY`]
/// whatever the lookup returned. Other misses are labeled [`UNKNOWN_LABEL`].
pub fn correlation_label<'a>(id: u64, found: Option<&'a str>) -> &'a str {
    if id == 0 {
        return IMPLICIT_DENY;
    }
    found.unwrap_or(UNKNOWN_LABEL)
}
