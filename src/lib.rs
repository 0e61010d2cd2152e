// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-hubspot
//!
//! A Singer tap extracting CRM, marketing and engagement data from the
//! HubSpot API.
//!
//! ## Features
//!
//! - **Dynamic Schemas**: CRM object properties are discovered per portal
//! - **Pagination**: Cursor, offset, CRM search and event-type iteration
//! - **Incremental Sync**: Bookmarks per stream or partition, epoch conversion
//! - **Associations**: Batched, concurrent association lookups
//! - **Singer Output**: SCHEMA, RECORD and STATE messages on stdout
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_hubspot::{builtin_catalog, Connector, HubspotConnector, SingerWriter, StateManager, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_hubspot::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let connector = HubspotConnector::new(config, builtin_catalog()?)?;
//!
//!     let mut writer = SingerWriter::new(std::io::stdout());
//!     let streams = vec!["contacts".to_string()];
//!     connector.read(&streams, StateManager::in_memory(), &mut writer).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Connector Interface                         │
//! │  check() → Status    discover() → Catalog    read() → Messages   │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬──────────────┬────────────┐
//! │   Auth   │   HTTP    │   Paginate    │ Associations │   Output   │
//! ├──────────┼───────────┼───────────────┼──────────────┼────────────┤
//! │ Bearer   │ GET/POST  │ Cursor        │ Batch read   │ Singer     │
//! │ OAuth2   │ Retry     │ Offset        │ Workers      │ JSON lines │
//! │ Refresh  │ Rate Limit│ Search        │              │            │
//! │          │ Backoff   │ Event types   │              │            │
//! └──────────┴───────────┴───────────────┴──────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Partition routing
pub mod partition;

/// Record extraction from responses
pub mod decode;

/// State management and bookmarks
pub mod state;

/// Static and discovered schemas
pub mod schema;

/// Batched association lookups
pub mod associations;

/// Stream catalog
pub mod streams;

/// Main execution engine
pub mod engine;

/// Singer message output
pub mod output;

/// Template interpolation
pub mod template;

/// Run configuration
pub mod config;

/// Connector trait and the HubSpot connector
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::TapConfig;
pub use connector::{Catalog, CatalogEntry, CheckResult, Connector, HubspotConnector};
pub use engine::{Message, SyncConfig, SyncEngine, SyncStats};
pub use output::{MessageSink, SingerWriter};
pub use state::StateManager;
pub use streams::{builtin_catalog, load_catalog, StreamCatalog, StreamDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
