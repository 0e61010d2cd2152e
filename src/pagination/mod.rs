//! Pagination module
//!
//! Supports: Cursor-after, Offset (`hasMore`), Event-type iteration, CRM
//! search, and single-request endpoints.
//!
//! # Overview
//!
//! Every strategy turns a response body into the [`PageToken`] of the next
//! page, or `None` once the current resource is exhausted. Strategies are
//! selected per stream by the catalog's `pagination` block.

mod strategies;
mod types;

pub use strategies::{
    CursorPaginator, EventTypePaginator, NoPaginator, OffsetPaginator, SearchPaginator,
    SearchWindow, SEARCH_PAGE_SIZE, SEARCH_RESULT_CAP,
};
pub use types::{PageToken, PaginationConfig, PaginationState, Paginator};

#[cfg(test)]
mod tests;
