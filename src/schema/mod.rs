//! Schema module
//!
//! JSON Schema types for stream declarations, and dynamic discovery of CRM
//! object schemas from the properties API.
//!
//! # Features
//!
//! - **Static Schemas**: compact `field: type` declarations from the catalog
//! - **Dynamic Discovery**: one properties call per stream, cached
//! - **Nullable Types**: every declared field accepts `null`

mod resolver;
mod types;

pub use resolver::{build_crm_schema, DynamicSchema, PropertyMap, ResolvedSchema, SchemaResolver};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
