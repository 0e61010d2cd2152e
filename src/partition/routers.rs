//! Partition router implementations

use super::types::{PartitionRouter, PartitionValue};
use crate::decode::value_at_path;
use crate::error::Result;
use crate::types::{scalar_to_string, JsonValue};
use std::collections::HashSet;

// ============================================================================
// List Router
// ============================================================================

/// Creates one partition per value of a static list
#[derive(Debug, Clone)]
pub struct ListRouter {
    values: Vec<String>,
    partition_field: String,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(values: Vec<String>, partition_field: impl Into<String>) -> Self {
        Self {
            values,
            partition_field: partition_field.into(),
        }
    }
}

impl PartitionRouter for ListRouter {
    fn partitions(&self) -> Result<Vec<PartitionValue>> {
        Ok(self
            .values
            .iter()
            .map(|v| PartitionValue::new(v.clone()).with_value(self.partition_field.clone(), v.clone()))
            .collect())
    }

    fn partition_field(&self) -> &str {
        &self.partition_field
    }
}

// ============================================================================
// Parent Router
// ============================================================================

/// Creates one partition per distinct key found in parent records
///
/// Records without the key are skipped. Partition order follows the first
/// occurrence of each key.
#[derive(Debug, Clone)]
pub struct ParentRouter {
    parent_records: Vec<JsonValue>,
    parent_key: String,
    partition_field: String,
}

impl ParentRouter {
    /// Create a new parent router
    pub fn new(
        parent_records: Vec<JsonValue>,
        parent_key: impl Into<String>,
        partition_field: impl Into<String>,
    ) -> Self {
        Self {
            parent_records,
            parent_key: parent_key.into(),
            partition_field: partition_field.into(),
        }
    }
}

impl PartitionRouter for ParentRouter {
    fn partitions(&self) -> Result<Vec<PartitionValue>> {
        let mut seen = HashSet::new();

        Ok(self
            .parent_records
            .iter()
            .filter_map(|record| value_at_path(record, &self.parent_key).and_then(scalar_to_string))
            .filter(|key| seen.insert(key.clone()))
            .map(|key| PartitionValue::new(key.clone()).with_value(self.partition_field.clone(), key))
            .collect())
    }

    fn partition_field(&self) -> &str {
        &self.partition_field
    }
}
