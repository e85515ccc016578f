//! First-present lookups over loosely shaped upstream JSON, and the
//! degrade-on-failure combinator used by best-effort enrichment.
//!
//! Upstream payloads move fields around between endpoints and revisions.
//! Instead of nesting `or_else` chains per field, callers list the places a
//! value may live as JSON pointers and take the first one that is present.
//!
//! # Example
//!
//! ```rust
//! use bilicard_core::fallback::first_str;
//! use serde_json::json;
//!
//! let v = json!({"owner": {"face": ""}, "author": {"face": "https://i0/face.jpg"}});
//! assert_eq!(first_str(&v, &["/owner/face", "/author/face"]), Some("https://i0/face.jpg"));
//! ```

use std::fmt::Display;

use serde_json::Value;

/// Whether a value counts as present: not null, not an empty string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Returns the first present value among `pointers`.
pub fn first_present<'a>(value: &'a Value, pointers: &[&str]) -> Option<&'a Value> {
    pointers.iter().filter_map(|p| value.pointer(p)).find(|v| is_present(v))
}

/// Returns the first non-empty string among `pointers`.
pub fn first_str<'a>(value: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
}

/// Returns the first integer among `pointers`. Numeric strings count, since
/// some endpoints quote their ids.
pub fn first_i64(value: &Value, pointers: &[&str]) -> Option<i64> {
    pointers.iter().filter_map(|p| value.pointer(p)).find_map(as_i64_lenient)
}

/// Returns the first non-zero integer among `pointers`.
pub fn first_nonzero_i64(value: &Value, pointers: &[&str]) -> Option<i64> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(as_i64_lenient)
        .find(|n| *n != 0)
}

fn as_i64_lenient(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Absorbs the failure of a best-effort sub-operation.
///
/// The error is logged under `label` and replaced by `None`, so the caller
/// can keep assembling the rest of the record.
pub fn degrade<T, E: Display>(label: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(field = label, error = %e, "enrichment failed, leaving field absent");
            None
        }
    }
}
