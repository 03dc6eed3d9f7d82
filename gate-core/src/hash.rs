//! Deterministic content hashing for evidence and policy traces.
//!
//! Hashes are blake3 over a canonical JSON rendering with
//! recursively key-sorted objects, so the same logical value hashes
//! identically regardless of map insertion order.

use serde::Serialize;
use serde_json::Value;

/// Render a JSON value canonically: objects with sorted keys, arrays
/// in order, scalars via `serde_json`.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let rendered: Vec<String> = keys
                .iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        Value::String((*key).clone()),
                        canonical_json(&map[*key])
                    )
                })
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
        scalar => scalar.to_string(),
    }
}

/// Hex-encoded blake3 of the canonical JSON form of `value`.
pub fn content_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_value(value).unwrap_or(Value::Null);
    blake3::hash(canonical_json(&json).as_bytes())
        .to_hex()
        .to_string()
}
