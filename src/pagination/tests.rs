//! Tests for pagination module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ============================================================================
// Cursor Pagination Tests
// ============================================================================

#[test]
fn test_cursor_reads_paging_next_after() {
    let paginator = CursorPaginator::default();
    let body = json!({"results": [], "paging": {"next": {"after": "abc", "link": "..."}}});

    let next = paginator.next_token(&body, None);
    assert_eq!(next, Some(PageToken::Cursor("abc".to_string())));
    assert_eq!(
        paginator.request_params(next.as_ref()),
        params(&[("after", "abc")])
    );
}

#[test]
fn test_cursor_numeric_after_is_rendered_as_string() {
    let paginator = CursorPaginator::default();
    let body = json!({"paging": {"next": {"after": 200}}});
    assert_eq!(
        paginator.next_token(&body, None),
        Some(PageToken::Cursor("200".to_string()))
    );
}

#[test]
fn test_cursor_terminates_without_paging() {
    let paginator = CursorPaginator::default();
    assert_eq!(paginator.next_token(&json!({"results": []}), None), None);
    assert_eq!(paginator.next_token(&json!({"paging": {}}), None), None);
    assert_eq!(paginator.next_token(&json!({"paging": {"next": {}}}), None), None);
    assert_eq!(
        paginator.next_token(&json!({"paging": {"next": {"after": ""}}}), None),
        None
    );
    assert_eq!(paginator.next_token(&json!([{"id": 1}]), None), None);
}

#[test]
fn test_cursor_first_request_has_no_param() {
    let paginator = CursorPaginator::default();
    assert!(paginator.request_params(None).is_empty());
    assert_eq!(paginator.first_token(), None);
    assert!(!paginator.is_exhausted());
}

// ============================================================================
// Offset Pagination Tests
// ============================================================================

#[test]
fn test_offset_followed_while_has_more() {
    let paginator = OffsetPaginator::default();
    let body = json!({"events": [], "hasMore": true, "offset": 250});

    let next = paginator.next_token(&body, None);
    assert_eq!(next, Some(PageToken::Offset(250)));
    assert_eq!(
        paginator.request_params(next.as_ref()),
        params(&[("offset", "250")])
    );
}

#[test]
fn test_offset_stops_when_has_more_false() {
    let paginator = OffsetPaginator::default();
    assert_eq!(
        paginator.next_token(&json!({"hasMore": false, "offset": 250}), None),
        None
    );
    assert_eq!(paginator.next_token(&json!({"offset": 250}), None), None);
}

#[test]
fn test_offset_string_token_and_custom_names() {
    let paginator = OffsetPaginator::new("has-more", "vid-offset", "vidOffset");
    let body = json!({"has-more": true, "vid-offset": "Cg4wMjgz"});

    let next = paginator.next_token(&body, None);
    assert_eq!(next, Some(PageToken::Cursor("Cg4wMjgz".to_string())));
    assert_eq!(
        paginator.request_params(next.as_ref()),
        params(&[("vidOffset", "Cg4wMjgz")])
    );
}

// ============================================================================
// Event-Type Iteration Tests
// ============================================================================

fn event_paginator() -> EventTypePaginator {
    EventTypePaginator::new(
        vec!["e_visited_page".to_string(), "e_form_submitted".to_string()],
        "eventType",
        CursorPaginator::default(),
    )
}

#[test]
fn test_event_types_start_with_first_type() {
    let paginator = event_paginator();
    let first = paginator.first_token();

    assert_eq!(
        first,
        Some(PageToken::EventType {
            event_type: "e_visited_page".to_string(),
            cursor: None
        })
    );
    assert_eq!(
        paginator.request_params(first.as_ref()),
        params(&[("eventType", "e_visited_page")])
    );
}

#[test]
fn test_event_types_inner_cursor_then_next_type() {
    let paginator = event_paginator();
    let first = paginator.first_token();

    let second = paginator.next_token(&json!({"paging": {"next": {"after": "c1"}}}), first.as_ref());
    assert_eq!(
        paginator.request_params(second.as_ref()),
        params(&[("eventType", "e_visited_page"), ("after", "c1")])
    );

    let third = paginator.next_token(&json!({"results": []}), second.as_ref());
    assert_eq!(
        third,
        Some(PageToken::EventType {
            event_type: "e_form_submitted".to_string(),
            cursor: None
        })
    );

    let done = paginator.next_token(&json!({"results": []}), third.as_ref());
    assert_eq!(done, None);
}

#[test]
fn test_event_types_skip_failed_type() {
    let paginator = event_paginator();
    assert!(paginator.skips_failed_resources());

    let first = paginator.first_token();
    assert_eq!(
        paginator.resource_name(first.as_ref()).as_deref(),
        Some("e_visited_page")
    );

    let skipped = paginator.skip_resource(first.as_ref());
    assert_eq!(
        paginator.resource_name(skipped.as_ref()).as_deref(),
        Some("e_form_submitted")
    );
    assert_eq!(paginator.skip_resource(skipped.as_ref()), None);
}

#[test]
fn test_event_types_repeated_type_read_once() {
    let paginator = EventTypePaginator::new(
        vec!["A".to_string(), "B".to_string(), "A".to_string()],
        "eventType",
        CursorPaginator::default(),
    );

    let mut visited = Vec::new();
    let mut token = paginator.first_token();
    while let Some(current) = token {
        visited.push(paginator.resource_name(Some(&current)).unwrap());
        assert!(visited.len() <= 3, "event types did not terminate");
        token = paginator.next_token(&json!({"results": []}), Some(&current));
    }

    assert_eq!(visited, vec!["A", "B"]);
}

#[test]
fn test_event_types_empty_list_is_exhausted() {
    let paginator = EventTypePaginator::new(vec![], "eventType", CursorPaginator::default());
    assert!(paginator.is_exhausted());
    assert_eq!(paginator.first_token(), None);

    let state = PaginationState::start(&paginator);
    assert!(state.done);
}

// ============================================================================
// Search Pagination Tests
// ============================================================================

#[test]
fn test_search_window() {
    assert_eq!(SearchPaginator::window(None), SearchWindow::Start);
    assert_eq!(
        SearchPaginator::window(Some(&PageToken::Offset(100))),
        SearchWindow::After(100)
    );
    assert_eq!(
        SearchPaginator::window(Some(&PageToken::Offset(9_800))),
        SearchWindow::After(9_800)
    );
    assert_eq!(
        SearchPaginator::window(Some(&PageToken::Offset(9_900))),
        SearchWindow::Reanchor
    );
    assert_eq!(
        SearchPaginator::window(Some(&PageToken::Cursor("9950".to_string()))),
        SearchWindow::Reanchor
    );
    assert_eq!(
        SearchPaginator::window(Some(&PageToken::Offset(u64::MAX))),
        SearchWindow::Reanchor
    );
}

#[test]
fn test_search_next_token() {
    let paginator = SearchPaginator::new();
    assert_eq!(
        paginator.next_token(&json!({"paging": {"next": {"after": "200"}}}), None),
        Some(PageToken::Offset(200))
    );
    assert_eq!(paginator.next_token(&json!({"total": 3}), None), None);
    assert!(paginator.request_params(Some(&PageToken::Offset(200))).is_empty());
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_pagination_config_from_yaml() {
    let config: PaginationConfig = serde_yaml::from_str("type: cursor").unwrap();
    assert_eq!(config, PaginationConfig::default());

    let config: PaginationConfig =
        serde_yaml::from_str("type: event_types\nevent_types_path: /events/v3/events/event-types")
            .unwrap();
    assert_eq!(config.kind(), "event_types");
    match config {
        PaginationConfig::EventTypes {
            event_types_field,
            event_type_param,
            ..
        } => {
            assert_eq!(event_types_field, "eventTypes");
            assert_eq!(event_type_param, "eventType");
        }
        other => panic!("Expected event_types, got {other:?}"),
    }

    let config: PaginationConfig = serde_yaml::from_str("type: none").unwrap();
    assert_eq!(config, PaginationConfig::None);
}

#[test]
fn test_pagination_config_build() {
    let paginator = PaginationConfig::default().build(vec![]);
    assert_eq!(
        paginator.next_token(&json!({"paging": {"next": {"after": "x"}}}), None),
        Some(PageToken::Cursor("x".to_string()))
    );

    let paginator = PaginationConfig::None.build(vec![]);
    assert_eq!(
        paginator.next_token(&json!({"paging": {"next": {"after": "x"}}}), None),
        None
    );
}

#[test]
fn test_pagination_state_advance() {
    let paginator = CursorPaginator::default();
    let mut state = PaginationState::start(&paginator);
    assert!(!state.done);

    state.advance(100, Some(PageToken::Cursor("a".to_string())));
    assert_eq!(state.pages, 1);
    assert_eq!(state.total_fetched, 100);
    assert!(!state.done);

    state.advance(20, None);
    assert_eq!(state.total_fetched, 120);
    assert!(state.done);
}

#[test]
fn test_pagination_state_skip_to() {
    let paginator = EventTypePaginator::new(
        vec!["e_a".to_string(), "e_b".to_string()],
        "eventType",
        CursorPaginator::default(),
    );
    let mut state = PaginationState::start(&paginator);

    let next = paginator.skip_resource(state.token.as_ref());
    state.skip_to(next);
    assert_eq!(state.pages, 0);
    assert_eq!(
        state.token,
        Some(PageToken::EventType {
            event_type: "e_b".to_string(),
            cursor: None
        })
    );

    let next = paginator.skip_resource(state.token.as_ref());
    state.skip_to(next);
    assert!(state.done);
}
