//! Dynamic schema discovery for CRM objects
//!
//! CRM object streams (contacts, deals, tickets, ...) expose portal-specific
//! custom properties. Their schema is discovered from the properties API
//! once per stream and reused for every page request of that stream.

use super::types::{JsonSchema, SchemaProperty};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Property name -> declared HubSpot type (`string`, `number`,
/// `datetime`, `enumeration`, ...), in the order the API lists them
pub type PropertyMap = serde_json::Map<String, JsonValue>;

/// Fetches property metadata from `/crm/v3/properties/{entity}`
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    client: Arc<HttpClient>,
}

impl SchemaResolver {
    /// Create a resolver sharing the run's HTTP client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Fetch the property map of an entity type.
    ///
    /// Issues exactly one request. Any failure is reported as
    /// `Error::UpstreamMetadata`; there is no fallback schema.
    pub async fn resolve(&self, entity_type: &str) -> Result<PropertyMap> {
        let path = format!("/crm/v3/properties/{entity_type}");
        debug!(entity = entity_type, "Discovering properties");

        let body = self
            .client
            .get_json(&path, RequestConfig::new())
            .await
            .map_err(|e| Error::upstream_metadata(entity_type, e.to_string()))?;

        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| {
                Error::upstream_metadata(entity_type, "response has no 'results' array")
            })?;

        let properties: PropertyMap = results
            .iter()
            .filter_map(|prop| {
                let name = prop.get("name")?.as_str()?;
                let declared = prop
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("string");
                Some((name.to_string(), JsonValue::from(declared)))
            })
            .collect();

        info!(
            entity = entity_type,
            count = properties.len(),
            "Discovered properties"
        );

        Ok(properties)
    }
}

/// Build the record schema of a CRM object stream.
///
/// Every discovered property is typed as a nullable string inside the
/// `properties` object, whatever type HubSpot declares for it.
pub fn build_crm_schema(properties: &PropertyMap, replication_key: Option<&str>) -> JsonSchema {
    let nested: BTreeMap<String, SchemaProperty> = properties
        .keys()
        .map(|name| (name.clone(), SchemaProperty::string()))
        .collect();

    let mut schema = JsonSchema::new();
    schema.add_property("id", SchemaProperty::string());
    schema.add_property("properties", SchemaProperty::object(nested));
    schema.add_property("createdAt", SchemaProperty::date_time());
    schema.add_property("updatedAt", SchemaProperty::date_time());
    schema.add_property(
        "archived",
        SchemaProperty::nullable(super::types::JsonType::Boolean),
    );

    if let Some(key) = replication_key {
        schema.add_property(key, SchemaProperty::date_time());
    }

    schema
}

/// Discovered schema of one stream
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    /// Discovered properties
    pub properties: PropertyMap,
    /// Record schema built from them
    pub schema: JsonSchema,
}

impl ResolvedSchema {
    /// Property names, in request order
    pub fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }
}

/// Lazily discovered schema of one stream, resolved at most once
#[derive(Debug)]
pub struct DynamicSchema {
    entity: String,
    replication_key: Option<String>,
    cell: OnceCell<ResolvedSchema>,
}

impl DynamicSchema {
    /// Create an unresolved schema for an entity type
    pub fn new(entity: impl Into<String>, replication_key: Option<String>) -> Self {
        Self {
            entity: entity.into(),
            replication_key,
            cell: OnceCell::new(),
        }
    }

    /// Resolve on first use, then return the cached result
    pub async fn get(&self, resolver: &SchemaResolver) -> Result<&ResolvedSchema> {
        self.cell
            .get_or_try_init(|| async {
                let properties = resolver.resolve(&self.entity).await?;
                let schema = build_crm_schema(&properties, self.replication_key.as_deref());
                Ok(ResolvedSchema { properties, schema })
            })
            .await
    }

    /// Whether discovery already ran
    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }
}
