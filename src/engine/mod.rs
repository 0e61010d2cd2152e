//! Execution engine module
//!
//! Runs any catalog stream through one state machine:
//!
//! ```text
//! INIT ─▶ FETCH_PAGE ─▶ PARSE ─▶ [ENRICH] ─▶ EMIT ─┐
//!              ▲                                    │
//!              └──────────── next token ◀──────────┘ ─▶ DONE
//! ```
//!
//! INIT resolves the schema and emits it. Each page is requested with the
//! stream's pagination token and bookmark, its records are extracted,
//! optionally enriched with associations, emitted in API order, and the
//! bookmark is checkpointed. Partitioned streams run the loop once per
//! partition.

mod request;
mod types;

pub use request::{
    add_fields, format_config_date, format_date_param, lift_replication_key, search_body,
};
pub use types::{Message, SyncConfig, SyncStats};

use crate::associations::{apply_associations, AssociationFetcher, AssociationSettings};
use crate::decode::{value_at_path, JsonDecoder};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::output::MessageSink;
use crate::pagination::{
    PageToken, PaginationConfig, PaginationState, Paginator, SearchPaginator, SearchWindow,
};
use crate::partition::{ListRouter, ParentRouter, PartitionConfig, PartitionRouter, PartitionValue};
use crate::schema::{DynamicSchema, JsonSchema, SchemaProperty, SchemaResolver};
use crate::state::{Bookmark, BookmarkTracker, StateManager};
use crate::streams::{StreamCatalog, StreamDefinition};
use crate::template::{self, TemplateContext};
use crate::types::{scalar_to_string, JsonValue};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Schema of a stream as used for one run
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSchema {
    /// Record schema
    pub schema: JsonSchema,
    /// Discovered property names, requested on every page (dynamic
    /// schemas only)
    pub properties: Vec<String>,
}

impl StreamSchema {
    /// Property names joined for the `properties` query parameter
    pub fn properties_param(&self) -> Option<String> {
        (!self.properties.is_empty()).then(|| self.properties.join(","))
    }
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    client: Arc<HttpClient>,
    resolver: SchemaResolver,
    associations: AssociationFetcher,
    state: StateManager,
    config: SyncConfig,
    context: TemplateContext,
    schemas: HashMap<String, Arc<DynamicSchema>>,
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine sharing the run's HTTP client
    pub fn new(
        client: Arc<HttpClient>,
        state: StateManager,
        associations: AssociationSettings,
    ) -> Self {
        Self {
            resolver: SchemaResolver::new(Arc::clone(&client)),
            associations: AssociationFetcher::new(Arc::clone(&client), associations),
            client,
            state,
            config: SyncConfig::default(),
            context: TemplateContext::new(),
            schemas: HashMap::new(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.context = TemplateContext::with_config(json!({
            "start_date": config.start_date,
            "end_date": config.end_date,
        }));
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    // ========================================================================
    // INIT
    // ========================================================================

    /// Schema of a stream. Dynamic schemas are discovered at most once per
    /// engine; a discovery failure is fatal for the stream.
    pub async fn stream_schema(&mut self, def: &StreamDefinition) -> Result<StreamSchema> {
        let Some(entity) = &def.dynamic_schema else {
            return Ok(StreamSchema {
                schema: JsonSchema::from_shorthand(&def.schema)?,
                properties: Vec::new(),
            });
        };

        let dynamic = Arc::clone(self.schemas.entry(def.name.clone()).or_insert_with(|| {
            Arc::new(DynamicSchema::new(entity.clone(), def.replication_key.clone()))
        }));
        let resolved = dynamic.get(&self.resolver).await?;

        let mut schema = resolved.schema.clone();
        for association in &def.associations {
            schema.add_property(&association.field, SchemaProperty::array(SchemaProperty::string()));
            if let Some(singular) = &association.singular_field {
                schema.add_property(singular, SchemaProperty::string());
            }
        }

        Ok(StreamSchema {
            schema,
            properties: resolved.property_names(),
        })
    }

    // ========================================================================
    // Stream
    // ========================================================================

    /// Sync one stream, emitting SCHEMA, RECORD and STATE messages
    pub async fn sync_stream(
        &mut self,
        def: &StreamDefinition,
        catalog: &StreamCatalog,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let started = Instant::now();
        let records_before = self.stats.records_synced;
        info!(stream = %def.name, mode = def.replication_method(), "Starting sync");

        let schema = self.stream_schema(def).await?;
        sink.emit(Message::schema(
            &def.name,
            schema.schema.to_json(),
            def.primary_keys.clone(),
            def.replication_key.as_deref(),
        ))?;

        match self.partitions(def, catalog).await? {
            None => self.sync_partition(def, &schema, None, true, sink).await?,
            Some(partitions) => {
                debug!(stream = %def.name, count = partitions.len(), "Found partitions");
                for partition in &partitions {
                    self.sync_partition(def, &schema, Some(partition), true, sink)
                        .await?;
                    self.stats.add_partition();
                }
            }
        }

        if def.is_incremental() {
            sink.emit(Message::state(self.state.to_value().await?))?;
        }

        self.stats.add_stream();
        self.stats
            .set_duration(self.stats.duration_ms + started.elapsed().as_millis() as u64);

        info!(
            stream = %def.name,
            records = self.stats.records_synced - records_before,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completed sync"
        );
        Ok(())
    }

    /// Partitions of a stream, `None` when it is not partitioned
    async fn partitions(
        &mut self,
        def: &StreamDefinition,
        catalog: &StreamCatalog,
    ) -> Result<Option<Vec<PartitionValue>>> {
        let Some(partition) = &def.partition else {
            return Ok(None);
        };

        let router: Box<dyn PartitionRouter> = match partition {
            PartitionConfig::List { values, field } => {
                Box::new(ListRouter::new(values.clone(), field.clone()))
            }
            PartitionConfig::Parent { stream, key, field } => {
                let parent = catalog.get(stream).ok_or_else(|| Error::StreamNotFound {
                    stream: stream.clone(),
                })?;
                let records = self.collect_records(parent).await.map_err(|e| {
                    Error::partition(&def.name, format!("reading parent '{stream}': {e}"))
                })?;
                Box::new(ParentRouter::new(records, key.clone(), field.clone()))
            }
        };

        router.partitions().map(Some)
    }

    /// Read all records of a parent stream without emitting them or
    /// touching state
    async fn collect_records(&mut self, def: &StreamDefinition) -> Result<Vec<JsonValue>> {
        if def.partition.is_some() {
            return Err(Error::config(format!(
                "Parent stream '{}' cannot itself be partitioned",
                def.name
            )));
        }

        let schema = self.stream_schema(def).await?;
        let mut collected: Vec<Message> = Vec::new();
        self.sync_partition(def, &schema, None, false, &mut collected)
            .await?;

        Ok(collected
            .into_iter()
            .filter_map(|message| match message {
                Message::Record { record, .. } => Some(record),
                _ => None,
            })
            .collect())
    }

    // ========================================================================
    // Page loop
    // ========================================================================

    /// Run the page loop for one partition (or the whole stream).
    ///
    /// With `checkpoint` unset no bookmark is read or written.
    async fn sync_partition(
        &mut self,
        def: &StreamDefinition,
        schema: &StreamSchema,
        partition: Option<&PartitionValue>,
        checkpoint: bool,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let ctx = match partition {
            Some(p) => self.context.for_partition(p.to_json()),
            None => self.context.clone(),
        };
        let partition_id = partition.map(|p| p.id.as_str());
        let path = template::render(&def.path, &ctx)?;
        let decoder = JsonDecoder::with_path(def.records_path.clone());

        let mut tracker = match (&def.replication_key, checkpoint) {
            (Some(_), true) => {
                let stored = self.state.get_bookmark(&def.name, partition_id).await;
                let start = BookmarkTracker::starting_value(
                    stored.as_ref(),
                    self.config.start_date.as_deref(),
                );
                Some(BookmarkTracker::new(def.replication_key_type, start))
            }
            _ => None,
        };

        // CRM search takes over once there is a starting bookmark
        let search_start = tracker
            .as_ref()
            .and_then(BookmarkTracker::start)
            .and_then(Bookmark::as_millis);
        let search = match (&def.search_path, &def.replication_key, search_start) {
            (Some(search_path), Some(key), Some(start)) => {
                Some((template::render(search_path, &ctx)?, key.as_str(), start))
            }
            _ => None,
        };

        let paginator: Box<dyn Paginator> = if search.is_some() {
            Box::new(SearchPaginator::new())
        } else {
            let event_types = match &def.pagination {
                PaginationConfig::EventTypes {
                    event_types_path,
                    event_types_field,
                    ..
                } => self.fetch_event_types(event_types_path, event_types_field).await?,
                _ => Vec::new(),
            };
            def.pagination.build(event_types)
        };

        debug!(
            stream = %def.name,
            partition = partition_id.unwrap_or("-"),
            pagination = if search.is_some() { "search" } else { def.pagination.kind() },
            "Reading"
        );

        let mut pages = PaginationState::start(paginator.as_ref());
        let mut anchor = search.as_ref().map(|(_, _, start)| *start);

        while !pages.done {
            let token = pages.token.clone();

            let response = match &search {
                Some((search_path, key, _)) => {
                    let Some(current_anchor) = anchor else { break };
                    let (query_anchor, after) = match SearchPaginator::window(token.as_ref()) {
                        SearchWindow::Start => (current_anchor, None),
                        SearchWindow::After(after) => (current_anchor, Some(after)),
                        SearchWindow::Reanchor => {
                            let next_anchor = tracker
                                .as_ref()
                                .and_then(BookmarkTracker::current)
                                .and_then(|b| b.as_millis())
                                .unwrap_or(current_anchor);
                            if next_anchor <= current_anchor {
                                warn!(
                                    stream = %def.name,
                                    anchor = current_anchor,
                                    "Search window cannot advance past result cap, stopping"
                                );
                                break;
                            }
                            debug!(stream = %def.name, anchor = next_anchor, "Re-anchoring search");
                            anchor = Some(next_anchor);
                            (next_anchor, None)
                        }
                    };
                    let body = search_body(key, query_anchor, after, &schema.properties);
                    self.client.post_json(search_path, body).await
                }
                None => {
                    let params = self.page_params(
                        def,
                        schema,
                        paginator.as_ref(),
                        token.as_ref(),
                        tracker.as_ref(),
                        &ctx,
                    )?;
                    self.client
                        .get_json(&path, RequestConfig::new().queries(params))
                        .await
                }
            };

            let body = match response {
                Ok(body) => body,
                Err(e) if paginator.skips_failed_resources() => {
                    let resource = paginator
                        .resource_name(token.as_ref())
                        .unwrap_or_else(|| def.name.clone());
                    let recovered = e.into_partition_error(&resource)?;
                    warn!(stream = %def.name, %resource, error = %recovered, "Skipping resource");
                    self.stats.add_skipped();
                    pages.skip_to(paginator.skip_resource(token.as_ref()));
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.stats.add_page();

            let mut records = decoder.extract(&body)?;
            let next = paginator.next_token(&body, token.as_ref());

            for record in &mut records {
                if def.dynamic_schema.is_some() {
                    if let Some(key) = &def.replication_key {
                        lift_replication_key(record, key);
                    }
                }
                add_fields(record, &def.add_fields, &ctx)?;
            }

            if !def.associations.is_empty() && !records.is_empty() {
                self.enrich(def, &mut records).await;
            }

            let fetched = records.len();
            let mut reached_start = false;
            for record in records {
                if let (Some(t), Some(key)) = (tracker.as_mut(), def.replication_key.as_deref()) {
                    let value = record.get(key).cloned().unwrap_or(JsonValue::Null);
                    t.observe(&value);
                    reached_start = def.reverse_ordered && t.is_before_start(&value);
                }
                sink.emit(Message::record(&def.name, record))?;
                self.stats.add_records(1);
                if reached_start {
                    break;
                }
            }

            if let (Some(t), Some(key)) = (&tracker, &def.replication_key) {
                if let Some(value) = t.state_value() {
                    self.state
                        .set_bookmark(&def.name, key, partition_id, value)
                        .await;
                    if self.config.emit_state_per_page {
                        sink.emit(Message::state(self.state.to_value().await?))?;
                    }
                }
            }

            pages.advance(fetched, next);
            if reached_start {
                debug!(stream = %def.name, "Reached records older than the bookmark");
                pages.mark_done();
            }
        }

        debug!(
            stream = %def.name,
            pages = pages.pages,
            records = pages.total_fetched,
            "Partition done"
        );
        Ok(())
    }

    /// Query parameters of one page request
    fn page_params(
        &self,
        def: &StreamDefinition,
        schema: &StreamSchema,
        paginator: &dyn Paginator,
        token: Option<&PageToken>,
        tracker: Option<&BookmarkTracker>,
        ctx: &TemplateContext,
    ) -> Result<Vec<(String, String)>> {
        let page_size = def.page_size.unwrap_or(self.config.page_size);
        let mut params = vec![("limit".to_string(), page_size.to_string())];
        params.extend(paginator.request_params(token));

        if let Some(key) = &def.replication_key {
            params.push(("sort".to_string(), "asc".to_string()));
            params.push(("order_by".to_string(), key.clone()));
        }

        if let Some(properties) = schema.properties_param() {
            params.push(("properties".to_string(), properties));
        }

        if let Some(incremental) = &def.incremental {
            if let (Some(param), Some(start)) = (
                &incremental.start_param,
                tracker.and_then(BookmarkTracker::start),
            ) {
                params.push((param.clone(), format_date_param(start, incremental.format)?));
            }
            if let (Some(param), Some(end)) = (&incremental.end_param, &self.config.end_date) {
                params.push((param.clone(), format_config_date(end, incremental.format)?));
            }
        }

        for (key, value) in &def.params {
            params.push((key.clone(), template::render(value, ctx)?));
        }

        Ok(params)
    }

    /// Merge the stream's associations onto a page of records
    async fn enrich(&self, def: &StreamDefinition, records: &mut [JsonValue]) {
        let ids: Vec<String> = records
            .iter()
            .filter_map(|r| r.get("id").and_then(scalar_to_string))
            .collect();
        let from = def.dynamic_schema.as_deref().unwrap_or(&def.name);

        let maps = self
            .associations
            .fetch_all(from, &ids, &def.associations)
            .await;
        apply_associations(records, "id", &def.associations, &maps);
    }

    /// Fetch the event types iterated by an event-type stream
    async fn fetch_event_types(&self, path: &str, field: &str) -> Result<Vec<String>> {
        let body = self.client.get_json(path, RequestConfig::new()).await?;
        let types = value_at_path(&body, field)
            .and_then(JsonValue::as_array)
            .ok_or_else(|| Error::decode(format!("'{path}' has no '{field}' array")))?;

        let types: Vec<String> = types
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect();
        info!(count = types.len(), "Fetched event types");
        Ok(types)
    }
}
