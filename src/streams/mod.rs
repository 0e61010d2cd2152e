//! Stream catalog module
//!
//! Every HubSpot stream is declared as data in a YAML catalog and executed
//! by the generic engine.
//!
//! # Overview
//!
//! The catalog provides:
//! - `StreamCatalog` - The set of streams the tap can read
//! - `StreamDefinition` - Path, keys, schema, pagination and per-stream options
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{builtin_catalog, load_catalog, load_catalog_from_str, BUILTIN_CATALOG};
pub use types::{CheckDefinition, IncrementalParams, StreamCatalog, StreamDefinition};

#[cfg(test)]
mod tests;
