//! Pagination strategy implementations
//!
//! Each strategy handles one of the addressing schemes HubSpot endpoints use.

use super::types::{PageToken, Paginator};
use crate::decode::value_at_path;
use serde_json::Value;
use std::collections::HashSet;

/// HubSpot search endpoints never return more than this many results for
/// one query
pub const SEARCH_RESULT_CAP: u64 = 10_000;

/// Page size of search requests
pub const SEARCH_PAGE_SIZE: u64 = 100;

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-after pagination used by the v3 CRM endpoints
///
/// Reads `paging.next.after`; an absent `paging`, absent `next` or empty
/// `paging` object ends pagination.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Query parameter name for cursor
    pub param: String,
    /// Dotted path of the cursor in the response
    pub path: String,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(param: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            path: path.into(),
        }
    }

    fn cursor_from(&self, body: &Value) -> Option<String> {
        match value_at_path(body, &self.path)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Default for CursorPaginator {
    fn default() -> Self {
        Self::new("after", "paging.next.after")
    }
}

impl Paginator for CursorPaginator {
    fn request_params(&self, token: Option<&PageToken>) -> Vec<(String, String)> {
        token
            .and_then(PageToken::param_value)
            .map(|v| vec![(self.param.clone(), v)])
            .unwrap_or_default()
    }

    fn next_token(&self, body: &Value, _current: Option<&PageToken>) -> Option<PageToken> {
        self.cursor_from(body).map(PageToken::Cursor)
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// `hasMore` + offset pagination used by the legacy v1/v2 endpoints
///
/// The offset is followed only while `hasMore` is true.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Boolean field signalling more pages
    pub has_more_field: String,
    /// Response field holding the next offset
    pub offset_field: String,
    /// Request parameter carrying the offset
    pub offset_param: String,
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(
        has_more_field: impl Into<String>,
        offset_field: impl Into<String>,
        offset_param: impl Into<String>,
    ) -> Self {
        Self {
            has_more_field: has_more_field.into(),
            offset_field: offset_field.into(),
            offset_param: offset_param.into(),
        }
    }
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new("hasMore", "offset", "offset")
    }
}

impl Paginator for OffsetPaginator {
    fn request_params(&self, token: Option<&PageToken>) -> Vec<(String, String)> {
        token
            .and_then(PageToken::param_value)
            .map(|v| vec![(self.offset_param.clone(), v)])
            .unwrap_or_default()
    }

    fn next_token(&self, body: &Value, _current: Option<&PageToken>) -> Option<PageToken> {
        let has_more = value_at_path(body, &self.has_more_field)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !has_more {
            return None;
        }
        value_at_path(body, &self.offset_field).and_then(PageToken::from_scalar)
    }
}

// ============================================================================
// Event-Type Iteration
// ============================================================================

/// Outer loop over event types with an inner cursor loop per type
///
/// A failure for one event type (typically a 403 for a missing scope) only
/// abandons that type; iteration continues with the next one.
#[derive(Debug, Clone)]
pub struct EventTypePaginator {
    event_types: Vec<String>,
    event_type_param: String,
    inner: CursorPaginator,
}

impl EventTypePaginator {
    /// Create a paginator over the given event types. Repeated types are
    /// read once, at their first position.
    pub fn new(
        mut event_types: Vec<String>,
        event_type_param: impl Into<String>,
        inner: CursorPaginator,
    ) -> Self {
        let mut seen = HashSet::new();
        event_types.retain(|t| seen.insert(t.clone()));
        Self {
            event_types,
            event_type_param: event_type_param.into(),
            inner,
        }
    }

    fn first_page_of(&self, index: usize) -> Option<PageToken> {
        self.event_types
            .get(index)
            .map(|event_type| PageToken::EventType {
                event_type: event_type.clone(),
                cursor: None,
            })
    }
}

impl Paginator for EventTypePaginator {
    fn first_token(&self) -> Option<PageToken> {
        self.first_page_of(0)
    }

    fn is_exhausted(&self) -> bool {
        self.event_types.is_empty()
    }

    fn request_params(&self, token: Option<&PageToken>) -> Vec<(String, String)> {
        let Some(PageToken::EventType { event_type, cursor }) = token else {
            return Vec::new();
        };

        let mut params = vec![(self.event_type_param.clone(), event_type.clone())];
        if let Some(cursor) = cursor {
            params.push((self.inner.param.clone(), cursor.clone()));
        }
        params
    }

    fn next_token(&self, body: &Value, current: Option<&PageToken>) -> Option<PageToken> {
        let Some(PageToken::EventType { event_type, .. }) = current else {
            return None;
        };

        match self.inner.cursor_from(body) {
            Some(cursor) => Some(PageToken::EventType {
                event_type: event_type.clone(),
                cursor: Some(cursor),
            }),
            None => self.skip_resource(current),
        }
    }

    fn skips_failed_resources(&self) -> bool {
        true
    }

    fn resource_name(&self, token: Option<&PageToken>) -> Option<String> {
        match token {
            Some(PageToken::EventType { event_type, .. }) => Some(event_type.clone()),
            _ => None,
        }
    }

    fn skip_resource(&self, current: Option<&PageToken>) -> Option<PageToken> {
        let Some(PageToken::EventType { event_type, .. }) = current else {
            return None;
        };
        let index = self.event_types.iter().position(|t| t == event_type)?;
        self.first_page_of(index + 1)
    }
}

// ============================================================================
// CRM Search Pagination
// ============================================================================

/// Where the next search request starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchWindow {
    /// First request, filter from the starting bookmark
    Start,
    /// Continue the current query after this offset
    After(u64),
    /// The result cap is near: restart the query from the highest
    /// replication value seen so far, without `after`
    Reanchor,
}

/// Pagination of CRM search endpoints
///
/// Search results are addressed by a numeric `after` in the POST body and
/// capped at [`SEARCH_RESULT_CAP`]; near the cap the query is re-anchored.
#[derive(Debug, Clone, Default)]
pub struct SearchPaginator;

impl SearchPaginator {
    /// Create a new search paginator
    pub fn new() -> Self {
        Self
    }

    /// Decide how the request for `token` is addressed
    pub fn window(token: Option<&PageToken>) -> SearchWindow {
        let after = match token {
            None => return SearchWindow::Start,
            Some(PageToken::Offset(o)) => Some(*o),
            Some(PageToken::Cursor(c)) => c.parse::<u64>().ok(),
            Some(PageToken::EventType { .. }) => None,
        };

        match after {
            Some(after) if after.saturating_add(SEARCH_PAGE_SIZE) >= SEARCH_RESULT_CAP => {
                SearchWindow::Reanchor
            }
            Some(after) => SearchWindow::After(after),
            None => SearchWindow::Start,
        }
    }
}

impl Paginator for SearchPaginator {
    fn request_params(&self, _token: Option<&PageToken>) -> Vec<(String, String)> {
        Vec::new()
    }

    fn next_token(&self, body: &Value, _current: Option<&PageToken>) -> Option<PageToken> {
        match value_at_path(body, "paging.next.after")? {
            Value::Number(n) => n.as_u64().map(PageToken::Offset),
            Value::String(s) => s.parse::<u64>().ok().map(PageToken::Offset),
            _ => None,
        }
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// Single-request endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn request_params(&self, _token: Option<&PageToken>) -> Vec<(String, String)> {
        Vec::new()
    }

    fn next_token(&self, _body: &Value, _current: Option<&PageToken>) -> Option<PageToken> {
        None
    }
}
