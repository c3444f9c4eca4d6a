//! Deterministic sort-keyed JSON
//!
//! Object keys are sorted lexicographically at every depth and the output
//! carries no insignificant whitespace. The ordering is rebuilt explicitly
//! so the result does not depend on which map backs `serde_json::Value`.

use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Recursively sort every object's keys
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialize into a canonical `Value`
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(canonicalize(serde_json::to_value(value)?))
}

/// Serialize into canonical bytes
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let canonical = to_canonical_value(value)?;
    Ok(serde_json::to_vec(&canonical)?)
}

/// Re-encode arbitrary JSON bytes in canonical form
pub fn sort_json(bytes: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(serde_json::to_vec(&canonicalize(value))?)
}
