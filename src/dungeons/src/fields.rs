//! Typed reads of JSON objects that set unrecognized keys aside.
//!
//! Modeled keys are deserialized directly from their `Value`s, never through
//! serde's buffered `flatten` path, so numbers keep their original text and a
//! type error names the exact field that caused it.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// A field that failed to deserialize, located relative to its object
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldError {
    /// Path such as `power` or `enchantments[0].level`; empty for the object itself
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl fmt::Display) -> Self {
        FieldError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Full path of the failing field below `prefix`
    pub fn located_under(&self, prefix: &str) -> String {
        if self.path.is_empty() {
            prefix.to_string()
        } else if self.path.starts_with('[') {
            format!("{}{}", prefix, self.path)
        } else {
            format!("{}.{}", prefix, self.path)
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Deserialize the `known` keys of `object` as `T`, returning the rest untouched
pub(crate) fn split_known<T: DeserializeOwned>(
    object: Map<String, Value>,
    known: &[&str],
) -> Result<(T, Map<String, Value>), FieldError> {
    let mut modeled = Map::new();
    let mut extra = Map::new();
    for (key, value) in object {
        if known.contains(&key.as_str()) {
            modeled.insert(key, value);
        } else {
            extra.insert(key, value);
        }
    }

    let modeled = Value::Object(modeled);
    let parsed = serde_path_to_error::deserialize(&modeled).map_err(|e| {
        let path = e.path().to_string();
        let path = if path == "." { String::new() } else { path };
        FieldError::new(path, e.into_inner())
    })?;
    Ok((parsed, extra))
}

/// The object behind `value`, or an error naming what was found instead
pub(crate) fn expect_object(value: &Value) -> Result<Map<String, Value>, FieldError> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| FieldError::new("", "expected a JSON object"))
}
