//! Tests for decoder module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_no_path_array_body() {
    let decoder = JsonDecoder::new();
    let records = decoder.extract(&json!([{"id": 1}, {"id": 2}])).unwrap();
    assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
}

#[test]
fn test_no_path_object_body_is_single_record() {
    let decoder = JsonDecoder::new();
    let records = decoder.extract(&json!({"id": 1})).unwrap();
    assert_eq!(records, vec![json!({"id": 1})]);
}

#[test]
fn test_results_wildcard_path() {
    let decoder = JsonDecoder::with_path("$.results[*]");
    let body = json!({
        "results": [{"id": "101"}, {"id": "102"}],
        "paging": {"next": {"after": "102"}}
    });

    let records = decoder.extract(&body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["id"], "102");
}

#[test]
fn test_root_wildcard_path() {
    let decoder = JsonDecoder::with_path("$[*]");
    let records = decoder.extract(&json!([{"a": 1}])).unwrap();
    assert_eq!(records, vec![json!({"a": 1})]);
}

#[test]
fn test_missing_path_yields_no_records() {
    let decoder = JsonDecoder::with_path("$.results[*]");
    assert!(decoder.extract(&json!({"status": "ok"})).unwrap().is_empty());
    assert!(decoder.extract(&json!({"results": null})).unwrap().is_empty());
}

#[test]
fn test_nested_dot_path() {
    let decoder = JsonDecoder::with_path("data.items");
    let records = decoder
        .extract(&json!({"data": {"items": [1, 2, 3]}}))
        .unwrap();
    assert_eq!(records.len(), 3);
}

#[test]
fn test_jsonpath_projection() {
    let decoder = JsonDecoder::with_path("$.results[*].to[*]");
    let body = json!({
        "results": [
            {"from": {"id": "1"}, "to": [{"toObjectId": 10}, {"toObjectId": 11}]},
            {"from": {"id": "2"}, "to": [{"toObjectId": 12}]}
        ]
    });

    let records = decoder.extract(&body).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["toObjectId"], 12);
}

#[test]
fn test_value_at_path() {
    let body = json!({"paging": {"next": {"after": "abc"}}});
    assert_eq!(value_at_path(&body, "paging.next.after"), Some(&json!("abc")));
    assert_eq!(value_at_path(&body, "$.paging.next"), Some(&json!({"after": "abc"})));
    assert_eq!(value_at_path(&body, "paging.prev"), None);
    assert_eq!(value_at_path(&body, ""), Some(&body));
    assert_eq!(value_at_path(&json!([1]), "paging"), None);
}
