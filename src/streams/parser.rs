//! Catalog loading and validation
//!
//! The HubSpot catalog is embedded in the binary; a custom catalog file can
//! replace it from the command line.

use super::types::{StreamCatalog, StreamDefinition};
use crate::error::{Error, Result};
use crate::partition::PartitionConfig;
use crate::schema::JsonSchema;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// The built-in HubSpot catalog
pub const BUILTIN_CATALOG: &str = include_str!("../../connectors/hubspot.yaml");

/// Load and validate the built-in catalog
pub fn builtin_catalog() -> Result<StreamCatalog> {
    load_catalog_from_str(BUILTIN_CATALOG)
}

/// Load a catalog from a YAML file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<StreamCatalog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read catalog file '{}': {e}",
            path.display()
        ))
    })?;
    load_catalog_from_str(&content)
}

/// Load a catalog from a YAML string
pub fn load_catalog_from_str(yaml: &str) -> Result<StreamCatalog> {
    let catalog: StreamCatalog = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse catalog YAML: {e}")))?;

    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Validate a catalog
fn validate_catalog(catalog: &StreamCatalog) -> Result<()> {
    if catalog.name.is_empty() {
        return Err(Error::config("Catalog name cannot be empty"));
    }

    if catalog.streams.is_empty() {
        return Err(Error::config("Catalog must have at least one stream"));
    }

    let names: HashSet<&str> = catalog.streams.iter().map(|s| s.name.as_str()).collect();
    if names.len() != catalog.streams.len() {
        return Err(Error::config("Duplicate stream names found"));
    }

    for stream in &catalog.streams {
        validate_stream(stream, &names)?;
    }

    Ok(())
}

/// Validate one stream definition
fn validate_stream(stream: &StreamDefinition, names: &HashSet<&str>) -> Result<()> {
    let invalid = |message: String| Error::config(format!("Stream '{}': {message}", stream.name));

    if stream.name.is_empty() {
        return Err(Error::config("Stream name cannot be empty"));
    }

    if stream.path.is_empty() {
        return Err(invalid("path cannot be empty".to_string()));
    }

    match (&stream.dynamic_schema, stream.schema.is_empty()) {
        (None, true) => {
            return Err(invalid(
                "needs either a static schema or dynamic_schema".to_string(),
            ))
        }
        (Some(entity), _) if entity.is_empty() => {
            return Err(invalid("dynamic_schema entity cannot be empty".to_string()))
        }
        (None, false) => {
            JsonSchema::from_shorthand(&stream.schema).map_err(|e| invalid(e.to_string()))?;
        }
        _ => {}
    }

    if stream.page_size == Some(0) {
        return Err(invalid("page_size must be greater than 0".to_string()));
    }

    if !stream.is_incremental() {
        if stream.search_path.is_some() {
            return Err(invalid("search_path requires a replication_key".to_string()));
        }
        if stream.incremental.is_some() {
            return Err(invalid("incremental params require a replication_key".to_string()));
        }
        if stream.reverse_ordered {
            return Err(invalid("reverse_ordered requires a replication_key".to_string()));
        }
    }

    if stream.search_path.is_some() && stream.dynamic_schema.is_none() {
        return Err(invalid("search_path requires dynamic_schema".to_string()));
    }

    match &stream.partition {
        Some(PartitionConfig::List { values, .. }) if values.is_empty() => {
            return Err(invalid("partition list cannot be empty".to_string()));
        }
        Some(PartitionConfig::Parent { stream: parent, .. }) => {
            if parent == &stream.name {
                return Err(invalid("stream cannot be its own parent".to_string()));
            }
            if !names.contains(parent.as_str()) {
                return Err(invalid(format!("unknown parent stream '{parent}'")));
            }
        }
        _ => {}
    }

    let mut targets = HashSet::new();
    for association in &stream.associations {
        if association.to.is_empty() || association.field.is_empty() {
            return Err(invalid("association needs 'to' and 'field'".to_string()));
        }
        if !targets.insert(association.to.as_str()) {
            return Err(invalid(format!(
                "association '{}' declared twice",
                association.to
            )));
        }
    }

    Ok(())
}
