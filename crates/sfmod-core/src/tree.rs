//! Dot-path queries over parsed export records, and object-reference
//! parsing.
//!
//! A field counts as present only when it exists, is not JSON `null`, and is
//! not the empty string. Typed readers return `None` on a type mismatch, so
//! callers treat "wrong type" exactly like "absent".

use serde_json::Value;

/// Walk `path` (segments separated by `.`) from `root`. Object segments
/// select keys; numeric segments index arrays.
pub fn select<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    present(current).then_some(current)
}

/// A value that carries information: not null and not an empty string.
pub fn present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

// ===========================================================================
// Typed readers
// ===========================================================================

pub fn as_string(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

/// Integers, integral floats, and numeric strings.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Any number, or a numeric string.
pub fn as_double(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

// ===========================================================================
// Object references
// ===========================================================================

/// The path string inside a reference value. Dumpers emit references either
/// as a bare string, as `{ObjectName, ObjectPath}`, or as a soft path
/// `{AssetPathName, SubPathString}`.
pub fn reference_path(value: &Value) -> Option<&str> {
    let path = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("ObjectPath")
            .or_else(|| map.get("AssetPathName"))?
            .as_str()?,
        _ => return None,
    };
    (!path.is_empty() && path != "None").then_some(path)
}

/// Split a reference into its path and the suffix after the last `.` of its
/// final segment (`a/B.3` → `("a/B", Some("3"))`).
pub fn split_suffix(reference: &str) -> (&str, Option<&str>) {
    let name_start = reference.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match reference[name_start..].rfind('.') {
        Some(dot) => {
            let split = name_start + dot;
            (&reference[..split], Some(&reference[split + 1..]))
        }
        None => (reference, None),
    }
}

/// The numeric export index a reference ends with, if any.
pub fn export_index(reference: &str) -> Option<usize> {
    split_suffix(reference).1?.parse().ok()
}
