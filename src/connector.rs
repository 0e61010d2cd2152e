//! Connector trait and the HubSpot connector
//!
//! Defines the three operations of a tap (check, discover, read) and
//! implements them on top of the stream catalog and the sync engine.

use crate::associations::AssociationSettings;
use crate::auth::Authenticator;
use crate::config::TapConfig;
use crate::engine::{SyncConfig, SyncEngine, SyncStats};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::output::MessageSink;
use crate::state::StateManager;
use crate::streams::{StreamCatalog, StreamDefinition};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Discovery Catalog
// ============================================================================

/// Singer catalog produced by discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Discovered streams
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Entry of a stream
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.stream == stream)
    }
}

/// One stream of a Singer catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream id
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// JSON Schema of the records
    pub schema: JsonValue,
    /// Primary key fields
    pub key_properties: Vec<String>,
    /// Replication key, for incremental streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// `INCREMENTAL` or `FULL_TABLE`
    pub replication_method: String,
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Core trait of a tap
#[async_trait]
pub trait Connector: Send + Sync {
    /// Tests if credentials and configuration are valid
    async fn check(&self) -> Result<CheckResult>;

    /// Lists available streams with their schemas
    async fn discover(&self) -> Result<Catalog>;

    /// Reads the selected streams (all when `streams` is empty), emitting
    /// messages to `sink`. Bookmarks are read from and written to `state`.
    async fn read(
        &self,
        streams: &[String],
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats>;
}

// ============================================================================
// HubSpot Connector
// ============================================================================

/// The HubSpot tap
pub struct HubspotConnector {
    config: TapConfig,
    catalog: StreamCatalog,
    client: Arc<HttpClient>,
    state_per_page: bool,
}

impl HubspotConnector {
    /// Create a connector from a validated config and a stream catalog
    pub fn new(config: TapConfig, catalog: StreamCatalog) -> Result<Self> {
        let authenticator = Arc::new(Authenticator::new(config.auth_config()));
        let client = Arc::new(HttpClient::with_auth(config.http_config(), authenticator)?);
        Ok(Self {
            config,
            catalog,
            client,
            state_per_page: true,
        })
    }

    /// Emit state after every page (default) or only at stream end
    #[must_use]
    pub fn with_state_per_page(mut self, emit: bool) -> Self {
        self.state_per_page = emit;
        self
    }

    /// Stream catalog served by this connector
    pub fn catalog(&self) -> &StreamCatalog {
        &self.catalog
    }

    /// Sync engine for one run
    fn engine(&self, state: StateManager) -> SyncEngine {
        let mut associations = AssociationSettings {
            workers: self.config.association_workers,
            ..AssociationSettings::default()
        };
        associations
            .batch_sizes
            .extend(self.config.association_batch_sizes.clone());

        let sync_config = SyncConfig::new()
            .with_page_size(u64::from(self.config.page_size))
            .with_start_date(self.config.start_date.clone())
            .with_end_date(self.config.end_date.clone())
            .with_state_per_page(self.state_per_page);

        SyncEngine::new(Arc::clone(&self.client), state, associations).with_config(sync_config)
    }

    /// Resolve stream names to definitions, in catalog order
    fn selected(&self, streams: &[String]) -> Result<Vec<&StreamDefinition>> {
        if let Some(unknown) = streams.iter().find(|s| self.catalog.get(s).is_none()) {
            return Err(Error::StreamNotFound {
                stream: unknown.clone(),
            });
        }

        Ok(self
            .catalog
            .streams
            .iter()
            .filter(|s| streams.is_empty() || streams.contains(&s.name))
            .collect())
    }
}

#[async_trait]
impl Connector for HubspotConnector {
    async fn check(&self) -> Result<CheckResult> {
        let Some(check) = &self.catalog.check else {
            return Ok(CheckResult::success());
        };

        let request = RequestConfig::new().queries(check.params.clone());
        match self.client.get_json(&check.path, request).await {
            Ok(_) => Ok(CheckResult::success()),
            Err(e) => {
                warn!(error = %e, "Connection check failed");
                Ok(CheckResult::failure(
                    Error::ConnectionCheck {
                        message: e.to_string(),
                    }
                    .to_string(),
                ))
            }
        }
    }

    async fn discover(&self) -> Result<Catalog> {
        let mut engine = self.engine(StateManager::in_memory());
        let mut streams = Vec::with_capacity(self.catalog.streams.len());

        for def in &self.catalog.streams {
            let schema = engine.stream_schema(def).await?;
            streams.push(CatalogEntry {
                tap_stream_id: def.name.clone(),
                stream: def.name.clone(),
                schema: schema.schema.to_json(),
                key_properties: def.primary_keys.clone(),
                replication_key: def.replication_key.clone(),
                replication_method: def.replication_method().to_string(),
            });
        }

        info!(streams = streams.len(), "Discovered streams");
        Ok(Catalog { streams })
    }

    async fn read(
        &self,
        streams: &[String],
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let started = Instant::now();
        let selected = self.selected(streams)?;
        let mut engine = self.engine(state);

        for def in selected {
            engine.sync_stream(def, &self.catalog, sink).await?;
        }

        let mut stats = engine.stats().clone();
        stats.set_duration(started.elapsed().as_millis() as u64);
        info!(
            streams = stats.streams_synced,
            records = stats.records_synced,
            pages = stats.pages_fetched,
            skipped = stats.resources_skipped,
            duration_ms = stats.duration_ms,
            "Sync complete"
        );
        Ok(stats)
    }
}
