//! JSON record extraction

use crate::error::{Error, Result};
use serde_json::Value;

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Path to the records inside the response
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a decoder that treats the whole body as the record set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Records path, if any
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }

    /// Extract records from a decoded response body
    pub fn extract(&self, body: &Value) -> Result<Vec<Value>> {
        let Some(path) = self.record_path.as_deref() else {
            return Ok(into_records(body.clone()));
        };

        match simple_path(path) {
            Some(dotted) => Ok(value_at_path(body, dotted)
                .cloned()
                .map(into_records)
                .unwrap_or_default()),
            None => extract_with_jsonpath(body, path),
        }
    }
}

fn into_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(arr) => arr,
        Value::Null => vec![],
        other => vec![other],
    }
}

/// Reduce `$.a.b[*]` style paths to `a.b`. Returns `None` for paths that
/// need a real JSONPath engine.
fn simple_path(path: &str) -> Option<&str> {
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);
    let path = path.strip_suffix("[*]").unwrap_or(path);
    let path = path.strip_suffix('.').unwrap_or(path);

    if path.contains(['*', '[', '?', '(']) || path.contains("..") {
        None
    } else {
        Some(path)
    }
}

/// Look up a dotted path (`paging.next.after`) in a JSON value.
///
/// An empty path returns the value itself.
pub fn value_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    path.split('.')
        .try_fold(value, |current, part| current.as_object()?.get(part))
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    Ok(into_records(jp.find(value)))
}
