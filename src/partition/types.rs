//! Partition types and traits

use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single partition of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionValue {
    /// Unique identifier, also the key of the partition's bookmark
    pub id: String,
    /// Values exposed to templates as `partition.<key>`
    pub values: BTreeMap<String, JsonValue>,
}

impl PartitionValue {
    /// Create a new partition value
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Add a value to the partition
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Get a string value by key
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(JsonValue::as_str)
    }

    /// Values as a JSON object, for the template context
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<JsonObject>(),
        )
    }
}

/// Partitioning of a stream as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartitionConfig {
    /// One partition per static value
    List {
        /// Values to iterate
        values: Vec<String>,
        /// Partition field the value is exposed as
        field: String,
    },

    /// One partition per distinct key of a parent stream's records
    Parent {
        /// Name of the parent stream
        stream: String,
        /// Dotted path of the key in parent records
        #[serde(default = "default_parent_key")]
        key: String,
        /// Partition field the key is exposed as
        field: String,
    },
}

fn default_parent_key() -> String {
    "id".to_string()
}

impl PartitionConfig {
    /// Partition field exposed to templates
    pub fn field(&self) -> &str {
        match self {
            Self::List { field, .. } | Self::Parent { field, .. } => field,
        }
    }
}

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Generate partition values
    fn partitions(&self) -> Result<Vec<PartitionValue>>;

    /// Partition field name (for template interpolation)
    fn partition_field(&self) -> &str;
}
