//! Batched association lookups
//!
//! Association ids are not part of the object endpoints; they come from the
//! v4 batch read endpoint, one POST per batch of parent ids.

use crate::error::Error;
use crate::http::HttpClient;
use crate::types::{scalar_to_string, JsonValue};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parent id -> associated ids, in API order
pub type AssociationMap = HashMap<String, Vec<String>>;

/// Batch size used for association types without a configured size
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One association a stream's records are enriched with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationSpec {
    /// Association (target object) type, e.g. `contacts`
    pub to: String,
    /// Record field receiving the full id list
    pub field: String,
    /// Record field receiving the first id, or `null`
    #[serde(default)]
    pub singular_field: Option<String>,
}

/// Settings of the fetcher
#[derive(Debug, Clone)]
pub struct AssociationSettings {
    /// Maximum concurrent batch requests per association type
    pub workers: usize,
    /// Maximum ids per batch, by association type
    pub batch_sizes: HashMap<String, usize>,
}

impl Default for AssociationSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_sizes: HashMap::from([
                ("contacts".to_string(), 1000),
                ("companies".to_string(), 100),
            ]),
        }
    }
}

/// Fetches association ids for pages of parent records
#[derive(Debug, Clone)]
pub struct AssociationFetcher {
    client: Arc<HttpClient>,
    settings: AssociationSettings,
}

impl AssociationFetcher {
    /// Create a fetcher sharing the run's HTTP client
    pub fn new(client: Arc<HttpClient>, settings: AssociationSettings) -> Self {
        Self { client, settings }
    }

    /// Batch size applied to an association type
    pub fn batch_size(&self, association: &str) -> usize {
        self.settings
            .batch_sizes
            .get(association)
            .copied()
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .max(1)
    }

    /// Fetch the associations of type `to` for every parent id.
    ///
    /// Never fails: the result has an entry for every requested id, and
    /// the ids of a failed batch map to an empty list.
    pub async fn fetch(&self, from: &str, parent_ids: &[String], to: &str) -> AssociationMap {
        let mut merged: AssociationMap = parent_ids
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();

        if parent_ids.is_empty() {
            return merged;
        }

        let batch_size = self.batch_size(to);
        let workers = self.settings.workers.max(1);
        debug!(
            from,
            to,
            ids = parent_ids.len(),
            batch_size,
            workers,
            "Fetching associations"
        );

        let batches: Vec<_> = parent_ids
            .chunks(batch_size)
            .map(|batch| self.fetch_batch(from, to, batch))
            .collect();
        let results: Vec<AssociationMap> = stream::iter(batches)
            .buffer_unordered(workers)
            .collect()
            .await;

        for batch in results {
            for (parent, ids) in batch {
                if let Some(slot) = merged.get_mut(&parent) {
                    slot.extend(ids);
                }
            }
        }

        merged
    }

    /// Fetch several association types concurrently. Maps are returned in
    /// the order of `specs`.
    pub async fn fetch_all(
        &self,
        from: &str,
        parent_ids: &[String],
        specs: &[AssociationSpec],
    ) -> Vec<AssociationMap> {
        join_all(
            specs
                .iter()
                .map(|spec| self.fetch(from, parent_ids, &spec.to)),
        )
        .await
    }

    /// One batch request. Failures are logged and yield no associations.
    async fn fetch_batch(&self, from: &str, to: &str, batch: &[String]) -> AssociationMap {
        let path = format!("/crm/v4/associations/{from}/{to}/batch/read");
        let inputs: Vec<JsonValue> = batch.iter().map(|id| json!({ "id": id })).collect();

        match self.client.post_json(&path, json!({ "inputs": inputs })).await {
            Ok(body) => parse_batch_response(&body),
            Err(e) => {
                let err = Error::AssociationBatch {
                    from: from.to_string(),
                    to: to.to_string(),
                    message: e.to_string(),
                };
                warn!(ids = batch.len(), error = %err, "Association batch failed");
                AssociationMap::new()
            }
        }
    }
}

/// Extract `from.id -> [to[].toObjectId]` pairs from a batch response
pub fn parse_batch_response(body: &JsonValue) -> AssociationMap {
    let Some(results) = body.get("results").and_then(JsonValue::as_array) else {
        return AssociationMap::new();
    };

    results
        .iter()
        .filter_map(|result| {
            let from = result.get("from")?.get("id").and_then(scalar_to_string)?;
            let to = result
                .get("to")
                .and_then(JsonValue::as_array)
                .map(|targets| {
                    targets
                        .iter()
                        .filter_map(|t| t.get("toObjectId").and_then(scalar_to_string))
                        .collect()
                })
                .unwrap_or_default();
            Some((from, to))
        })
        .collect()
}

/// Write association fields onto records.
///
/// `maps` must be in the order of `specs`. Records without a usable id, or
/// missing from a map, get empty lists.
pub fn apply_associations(
    records: &mut [JsonValue],
    id_field: &str,
    specs: &[AssociationSpec],
    maps: &[AssociationMap],
) {
    for record in records.iter_mut() {
        let id = record.get(id_field).and_then(scalar_to_string);
        let Some(obj) = record.as_object_mut() else {
            continue;
        };

        for (spec, map) in specs.iter().zip(maps) {
            let ids = id
                .as_ref()
                .and_then(|id| map.get(id))
                .cloned()
                .unwrap_or_default();

            if let Some(singular) = &spec.singular_field {
                let first = ids.first().cloned().map_or(JsonValue::Null, JsonValue::String);
                obj.insert(singular.clone(), first);
            }
            obj.insert(
                spec.field.clone(),
                JsonValue::Array(ids.into_iter().map(JsonValue::String).collect()),
            );
        }
    }
}
