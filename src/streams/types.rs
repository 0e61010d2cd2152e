//! Catalog types
//!
//! Declarative stream definitions for YAML parsing.

use crate::associations::AssociationSpec;
use crate::pagination::PaginationConfig;
use crate::partition::PartitionConfig;
use crate::types::{DateParamFormat, ReplicationKeyType, SyncMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Catalog
// ============================================================================

/// Top-level stream catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamCatalog {
    /// Catalog name
    pub name: String,
    /// Catalog version
    #[serde(default = "default_version")]
    pub version: String,
    /// Endpoint used by `check`
    #[serde(default)]
    pub check: Option<CheckDefinition>,
    /// Stream definitions
    pub streams: Vec<StreamDefinition>,
}

impl StreamCatalog {
    /// Find a stream by name
    pub fn get(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Stream names, in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Connection check request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckDefinition {
    /// URL path for check endpoint
    pub path: String,
    /// Query parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

// ============================================================================
// Stream Definition
// ============================================================================

/// One stream of the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,

    /// URL path, may reference `{{ partition.<field> }}`
    pub path: String,

    /// Primary key fields
    #[serde(default)]
    pub primary_keys: Vec<String>,

    /// Replication key; its presence makes the stream incremental
    #[serde(default)]
    pub replication_key: Option<String>,

    /// Declared type of the replication key
    #[serde(default)]
    pub replication_key_type: ReplicationKeyType,

    /// JSONPath of the records in a response
    #[serde(default = "default_records_path")]
    pub records_path: String,

    /// Static schema as `field: type` shorthand
    #[serde(default)]
    pub schema: BTreeMap<String, String>,

    /// Entity type whose properties are discovered at runtime
    #[serde(default)]
    pub dynamic_schema: Option<String>,

    /// Pagination strategy
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Page size override, sent as `limit`
    #[serde(default)]
    pub page_size: Option<u64>,

    /// Static query parameters (templates allowed)
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Date filter parameters of incremental streams
    #[serde(default)]
    pub incremental: Option<IncrementalParams>,

    /// CRM search endpoint used once a starting bookmark exists
    #[serde(default)]
    pub search_path: Option<String>,

    /// Partitioning
    #[serde(default)]
    pub partition: Option<PartitionConfig>,

    /// Fields added to every record (templates allowed)
    #[serde(default)]
    pub add_fields: BTreeMap<String, String>,

    /// Associations merged onto each page of records
    #[serde(default)]
    pub associations: Vec<AssociationSpec>,

    /// Records arrive newest first; stop once one predates the bookmark
    #[serde(default)]
    pub reverse_ordered: bool,
}

fn default_records_path() -> String {
    "$.results[*]".to_string()
}

impl StreamDefinition {
    /// Sync mode implied by the replication key
    pub fn sync_mode(&self) -> SyncMode {
        if self.replication_key.is_some() {
            SyncMode::Incremental
        } else {
            SyncMode::FullRefresh
        }
    }

    /// Whether the stream is incremental
    pub fn is_incremental(&self) -> bool {
        self.sync_mode() == SyncMode::Incremental
    }

    /// Singer replication method name
    pub fn replication_method(&self) -> &'static str {
        match self.sync_mode() {
            SyncMode::Incremental => "INCREMENTAL",
            SyncMode::FullRefresh => "FULL_TABLE",
        }
    }

    /// Parent stream, when partitioned by one
    pub fn parent_stream(&self) -> Option<&str> {
        match &self.partition {
            Some(PartitionConfig::Parent { stream, .. }) => Some(stream),
            _ => None,
        }
    }
}

// ============================================================================
// Incremental Parameters
// ============================================================================

/// Request parameters bounding an incremental read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IncrementalParams {
    /// Parameter receiving the starting bookmark
    #[serde(default)]
    pub start_param: Option<String>,
    /// Parameter receiving the configured `end_date`
    #[serde(default)]
    pub end_param: Option<String>,
    /// Format both values are sent in
    #[serde(default)]
    pub format: DateParamFormat,
}
