//! Typed lookups over loosely shaped JSON responses
//!
//! Upstream payloads mix numbers and strings for the same field and omit keys
//! freely. These helpers turn a path lookup into an `Option` so callers handle
//! "not found" explicitly instead of probing for key presence.

use serde_json::Value;

/// Follow a path of object keys
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |current, key| current.get(*key))
}

/// Non-empty string at `keys`; numbers are rendered as decimal strings
pub fn string_at(value: &Value, keys: &[&str]) -> Option<String> {
    match path(value, keys)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unsigned integer at `keys`; accepts numeric strings and truncates floats
pub fn u64_at(value: &Value, keys: &[&str]) -> Option<u64> {
    match path(value, keys)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Signed integer at `keys`
pub fn i64_at(value: &Value, keys: &[&str]) -> Option<i64> {
    match path(value, keys)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Array at `keys`, or an empty slice when missing or of another type
pub fn array_at<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    path(value, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Object at `keys` that has at least one entry
pub fn non_empty_object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    path(value, keys).filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
}
