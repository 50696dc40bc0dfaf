//! Response shape sniffing.
//!
//! Different providers put the record array and the continuation cursor under
//! different keys. Each location is a path into the JSON body; the lists are
//! tried in order and the first usable match wins. Supporting a new provider
//! means appending one path here.

use serde_json::Value;

use super::RawRecord;

/// Paths that may hold the record array, in priority order.
pub const RECORD_PATHS: &[&[&str]] = &[&["data"], &["records"], &["result", "data"]];

/// Paths that may hold the continuation cursor, in priority order.
pub const CURSOR_PATHS: &[&[&str]] = &[
    &["cursor"],
    &["next_cursor"],
    &["pagination", "cursor"],
    &["pagination", "record_cursor"],
    &["record_cursor"],
];

fn lookup<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(body, |node, key| node.get(key))
}

/// Extract the continuation cursor, if any.
///
/// Null, empty strings and non-scalar values are skipped. Numeric cursors are
/// accepted and rendered as strings.
pub fn extract_cursor(body: &Value) -> Option<String> {
    CURSOR_PATHS.iter().find_map(|path| match lookup(body, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Extract the record array.
///
/// Returns `None` when no known path holds an array, which callers treat as
/// an unexpected response shape. Non-object array entries are dropped.
pub fn extract_records(body: &Value) -> Option<Vec<RawRecord>> {
    if let Value::Array(items) = body {
        return Some(objects(items));
    }

    RECORD_PATHS
        .iter()
        .find_map(|path| lookup(body, path)?.as_array())
        .map(|items| objects(items))
}

fn objects(items: &[Value]) -> Vec<RawRecord> {
    items.iter().filter_map(|item| item.as_object().cloned()).collect()
}
