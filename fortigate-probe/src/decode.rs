//! Decoding of objects that mix known fields with dynamically keyed records.
//!
//! Several FortiOS endpoints embed a resource collection as object keys next
//! to a handful of scalar fields:
//!
//! ```text
//! { "cpu": 3, "memory": 41, "session": { "current_usage": 12, ... }, "ipsec-phase1": { ... } }
//! ```
//!
//! [`decode`] moves the known keys into a typed struct and decodes every
//! remaining entry as the same sub-record type, keyed by its original name.

use std::collections::BTreeMap;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Names of the fixed fields of a mixed object.
pub trait FixedFields {
    const FIELDS: &'static [&'static str];
}

/// A mixed object split into its fixed part and its dynamic entries.
///
/// The dynamic map is ordered by key, so iterating it is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord<F, D> {
    pub fixed: F,
    pub dynamic: BTreeMap<String, D>,
}

/// Split `value` into the fields named in `fixed_fields` and uniform dynamic entries.
///
/// Fixed fields absent from the input are left to `F`'s serde defaults.
pub fn decode<F, D>(value: Value, fixed_fields: &[&str]) -> Result<DynamicRecord<F, D>, DecodeError>
where
    F: DeserializeOwned,
    D: DeserializeOwned,
{
    match value {
        Value::Object(map) => split(map, fixed_fields),
        other => Err(DecodeError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

fn split<F, D>(
    mut map: Map<String, Value>,
    fixed_fields: &[&str],
) -> Result<DynamicRecord<F, D>, DecodeError>
where
    F: DeserializeOwned,
    D: DeserializeOwned,
{
    let mut fixed = Map::new();
    for name in fixed_fields {
        if let Some(raw) = map.remove(*name) {
            fixed.insert((*name).to_string(), raw);
        }
    }

    let fixed = serde_json::from_value(Value::Object(fixed)).map_err(DecodeError::FixedField)?;

    let mut dynamic = BTreeMap::new();
    for (key, raw) in map {
        match serde_json::from_value(raw) {
            Ok(entry) => {
                dynamic.insert(key, entry);
            }
            Err(source) => return Err(DecodeError::DynamicEntry { key, source }),
        }
    }

    Ok(DynamicRecord { fixed, dynamic })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'de, F, D> Deserialize<'de> for DynamicRecord<F, D>
where
    F: FixedFields + DeserializeOwned,
    D: DeserializeOwned,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        split(map, F::FIELDS).map_err(de::Error::custom)
    }
}
