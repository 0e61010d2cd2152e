//! Pagination types and traits
//!
//! Defines the page token, the catalog-facing pagination config and the
//! `Paginator` trait every strategy implements.

use super::strategies::{
    CursorPaginator, EventTypePaginator, NoPaginator, OffsetPaginator, SearchPaginator,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque position carried from one page fetch to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Cursor string (`paging.next.after`, string offsets)
    Cursor(String),
    /// Numeric offset
    Offset(u64),
    /// Position inside an event-type iteration
    EventType {
        /// Event type currently being read
        event_type: String,
        /// Cursor within that event type, `None` for its first page
        cursor: Option<String>,
    },
}

impl PageToken {
    /// Value to send as the paging request parameter
    pub fn param_value(&self) -> Option<String> {
        match self {
            PageToken::Cursor(c) => Some(c.clone()),
            PageToken::Offset(o) => Some(o.to_string()),
            PageToken::EventType { cursor, .. } => cursor.clone(),
        }
    }

    /// Build a token from a scalar JSON value: numbers become offsets,
    /// non-empty strings become cursors.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(PageToken::Offset),
            Value::String(s) if !s.is_empty() => Some(PageToken::Cursor(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Cursor(c) => write!(f, "cursor:{c}"),
            PageToken::Offset(o) => write!(f, "offset:{o}"),
            PageToken::EventType { event_type, cursor } => {
                write!(f, "{event_type}:{}", cursor.as_deref().unwrap_or("-"))
            }
        }
    }
}

fn default_after_param() -> String {
    "after".to_string()
}

fn default_after_path() -> String {
    "paging.next.after".to_string()
}

fn default_has_more_field() -> String {
    "hasMore".to_string()
}

fn default_offset_field() -> String {
    "offset".to_string()
}

fn default_event_types_field() -> String {
    "eventTypes".to_string()
}

fn default_event_type_param() -> String {
    "eventType".to_string()
}

/// Pagination strategy as declared in the stream catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    /// Cursor-after pagination (`paging.next.after`)
    Cursor {
        /// Request parameter carrying the cursor
        #[serde(default = "default_after_param")]
        param: String,
        /// Dotted path of the cursor in the response
        #[serde(default = "default_after_path")]
        path: String,
    },

    /// `hasMore` + offset pagination used by legacy endpoints
    Offset {
        /// Boolean field signalling more pages
        #[serde(default = "default_has_more_field")]
        has_more_field: String,
        /// Response field holding the next offset
        #[serde(default = "default_offset_field")]
        offset_field: String,
        /// Request parameter carrying the offset
        #[serde(default = "default_offset_field")]
        offset_param: String,
    },

    /// Outer loop over event types, inner cursor loop per type
    EventTypes {
        /// Endpoint listing the event types
        event_types_path: String,
        /// Field of that response holding the list
        #[serde(default = "default_event_types_field")]
        event_types_field: String,
        /// Request parameter carrying the event type
        #[serde(default = "default_event_type_param")]
        event_type_param: String,
    },

    /// CRM search pagination (numeric `after` in the POST body)
    Search,

    /// Single request
    None,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::Cursor {
            param: default_after_param(),
            path: default_after_path(),
        }
    }
}

impl PaginationConfig {
    /// Short name of the strategy, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cursor { .. } => "cursor",
            Self::Offset { .. } => "offset",
            Self::EventTypes { .. } => "event_types",
            Self::Search => "search",
            Self::None => "none",
        }
    }

    /// Build the paginator for one resource.
    ///
    /// `event_types` is only consulted for event-type iteration; callers
    /// fetch the list once beforehand.
    pub fn build(&self, event_types: Vec<String>) -> Box<dyn Paginator> {
        match self {
            Self::Cursor { param, path } => Box::new(CursorPaginator::new(param, path)),
            Self::Offset {
                has_more_field,
                offset_field,
                offset_param,
            } => Box::new(OffsetPaginator::new(
                has_more_field,
                offset_field,
                offset_param,
            )),
            Self::EventTypes {
                event_type_param, ..
            } => Box::new(EventTypePaginator::new(
                event_types,
                event_type_param,
                CursorPaginator::default(),
            )),
            Self::Search => Box::new(SearchPaginator::new()),
            Self::None => Box::new(NoPaginator),
        }
    }
}

/// Tracks pagination progress of one resource
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Token for the next request
    pub token: Option<PageToken>,
    /// Pages fetched so far
    pub pages: u64,
    /// Records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Start pagination at the paginator's first position
    pub fn start(paginator: &dyn Paginator) -> Self {
        Self {
            token: paginator.first_token(),
            done: paginator.is_exhausted(),
            ..Self::default()
        }
    }

    /// Record a fetched page and move to `next`
    pub fn advance(&mut self, records: usize, next: Option<PageToken>) {
        self.pages += 1;
        self.total_fetched += records as u64;
        self.done = next.is_none();
        self.token = next;
    }

    /// Abandon the current resource and move to `next` without counting a
    /// page
    pub fn skip_to(&mut self, next: Option<PageToken>) {
        self.done = next.is_none();
        self.token = next;
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
        self.token = None;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Token for the first request. `None` requests the first page without
    /// a paging parameter.
    fn first_token(&self) -> Option<PageToken> {
        None
    }

    /// Whether there is nothing to request at all
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Query parameters addressing the page of `token`
    fn request_params(&self, token: Option<&PageToken>) -> Vec<(String, String)>;

    /// Compute the token of the next page from a response body. `None`
    /// ends pagination.
    fn next_token(&self, body: &Value, current: Option<&PageToken>) -> Option<PageToken>;

    /// Whether a failure on one resource may be skipped instead of failing
    /// the stream
    fn skips_failed_resources(&self) -> bool {
        false
    }

    /// Name of the resource addressed by `token`, for logging
    fn resource_name(&self, _token: Option<&PageToken>) -> Option<String> {
        None
    }

    /// Token of the first page after abandoning the resource of `current`
    fn skip_resource(&self, _current: Option<&PageToken>) -> Option<PageToken> {
        None
    }
}
