//! Canonical serialization, version 1.
//!
//! The exact bytes a client signs:
//!
//! - the payload's JSON value, with object keys sorted by code point at every depth
//! - no insignificant whitespace (`,` and `:` separators only)
//! - UTF-8 output, non-ASCII characters written as-is rather than `\u` escaped
//! - absent optional fields omitted, never `null`
//!
//! In Python this is `json.dumps(v, sort_keys=True, separators=(',', ':'), ensure_ascii=False)`.

use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Version of the canonical form clients must produce.
pub const CANONICAL_VERSION: u32 = 1;

/// Canonical bytes of `payload`.
pub fn canonical_bytes<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(payload)?);
    Ok(serde_json::to_vec(&value)?)
}

/// Canonical form of `payload` as a string.
pub fn canonical_string<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    let value = sort_keys(serde_json::to_value(payload)?);
    Ok(serde_json::to_string(&value)?)
}

// Rebuild objects in sorted order so the output does not depend on whether
// serde_json was built with `preserve_order`.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, sort_keys(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
