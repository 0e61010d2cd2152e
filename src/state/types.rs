//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs. The layout
//! follows the Singer convention:
//!
//! ```json
//! {
//!   "bookmarks": {
//!     "contacts": {"replication_key": "lastmodifieddate", "replication_key_value": "2024-07-01T00:00:00Z"},
//!     "form_submissions": {
//!       "replication_key": "submittedAt",
//!       "partitions": {"form_id=abc": {"replication_key_value": 1719792000000}}
//!     }
//!   }
//! }
//! ```

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a tap run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Stored bookmark for a stream, or for one of its partitions
    pub fn get_bookmark(&self, stream: &str, partition_id: Option<&str>) -> Option<&JsonValue> {
        let stream_state = self.bookmarks.get(stream)?;
        match partition_id {
            Some(id) => stream_state
                .partitions
                .get(id)?
                .replication_key_value
                .as_ref(),
            None => stream_state.replication_key_value.as_ref(),
        }
    }

    /// Store a bookmark for a stream, or for one of its partitions
    pub fn set_bookmark(
        &mut self,
        stream: &str,
        replication_key: &str,
        partition_id: Option<&str>,
        value: JsonValue,
    ) {
        let stream_state = self.get_stream_mut(stream);
        stream_state.replication_key = Some(replication_key.to_string());
        match partition_id {
            Some(id) => {
                stream_state.get_partition_mut(id).replication_key_value = Some(value);
            }
            None => stream_state.replication_key_value = Some(value),
        }
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Name of the replication key the bookmark refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Highest replication-key value emitted (string or epoch ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<JsonValue>,

    /// Per-partition state (for partitioned streams)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partitions: BTreeMap<String, PartitionState>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get partition state
    pub fn get_partition(&self, partition_id: &str) -> Option<&PartitionState> {
        self.partitions.get(partition_id)
    }

    /// Get mutable partition state, creating if needed
    pub fn get_partition_mut(&mut self, partition_id: &str) -> &mut PartitionState {
        self.partitions.entry(partition_id.to_string()).or_default()
    }
}

/// State for a single partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Highest replication-key value emitted within this partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert!(state.get_bookmark("contacts", None).is_none());
    }

    #[test]
    fn test_stream_bookmark() {
        let mut state = State::new();
        state.set_bookmark(
            "contacts",
            "lastmodifieddate",
            None,
            json!("2024-07-01T00:00:00Z"),
        );

        assert_eq!(
            state.get_bookmark("contacts", None),
            Some(&json!("2024-07-01T00:00:00Z"))
        );
        assert_eq!(
            state.get_stream("contacts").unwrap().replication_key.as_deref(),
            Some("lastmodifieddate")
        );
    }

    #[test]
    fn test_partition_bookmark() {
        let mut state = State::new();
        state.set_bookmark("form_submissions", "submittedAt", Some("form_id=a"), json!(10));
        state.set_bookmark("form_submissions", "submittedAt", Some("form_id=b"), json!(20));

        assert_eq!(
            state.get_bookmark("form_submissions", Some("form_id=a")),
            Some(&json!(10))
        );
        assert_eq!(
            state.get_bookmark("form_submissions", Some("form_id=b")),
            Some(&json!(20))
        );
        assert!(state.get_bookmark("form_submissions", None).is_none());
    }

    #[test]
    fn test_state_serialization_layout() {
        let mut state = State::new();
        state.set_bookmark("deals", "updatedAt", None, json!("2024-01-01T00:00:00Z"));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({
                "bookmarks": {
                    "deals": {
                        "replication_key": "updatedAt",
                        "replication_key_value": "2024-01-01T00:00:00Z"
                    }
                }
            })
        );

        let restored: State = serde_json::from_value(value).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_accepts_integer_and_string_bookmarks() {
        let state: State = serde_json::from_value(json!({
            "bookmarks": {
                "a": {"replication_key_value": 1719792000000_i64},
                "b": {"replication_key_value": "2024-07-01"}
            }
        }))
        .unwrap();

        assert_eq!(state.get_bookmark("a", None), Some(&json!(1_719_792_000_000_i64)));
        assert_eq!(state.get_bookmark("b", None), Some(&json!("2024-07-01")));
    }
}
