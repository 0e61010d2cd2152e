//! Tests for the stream catalog

use super::*;
use crate::pagination::PaginationConfig;
use crate::partition::PartitionConfig;
use crate::types::{DateParamFormat, ReplicationKeyType, SyncMode};
use pretty_assertions::assert_eq;
use test_case::test_case;

// ============================================================================
// Built-in Catalog
// ============================================================================

#[test]
fn test_builtin_catalog_loads() {
    let catalog = builtin_catalog().unwrap();
    assert_eq!(catalog.name, "hubspot");
    assert!(catalog.check.is_some());

    for name in [
        "contacts",
        "users",
        "owners",
        "ticket_pipelines",
        "deal_pipelines",
        "email_subscriptions",
        "properties",
        "companies",
        "deals",
        "feedback_submissions",
        "line_items",
        "products",
        "tickets",
        "quotes",
        "goals",
        "calls",
        "communications",
        "emails",
        "meetings",
        "notes",
        "postal_mail",
        "tasks",
        "forms",
        "form_submissions",
        "email_events",
        "events",
    ] {
        assert!(catalog.get(name).is_some(), "missing stream {name}");
    }
}

#[test_case("contacts", "lastmodifieddate")]
#[test_case("companies", "hs_lastmodifieddate")]
#[test_case("deals", "hs_lastmodifieddate")]
#[test_case("tasks", "hs_lastmodifieddate")]
fn test_dynamic_incremental_streams(name: &str, key: &str) {
    let catalog = builtin_catalog().unwrap();
    let stream = catalog.get(name).unwrap();

    assert_eq!(stream.replication_key.as_deref(), Some(key));
    assert_eq!(stream.dynamic_schema.as_deref(), Some(name));
    assert_eq!(
        stream.search_path.as_deref(),
        Some(format!("/crm/v3/objects/{name}/search").as_str())
    );
    assert_eq!(stream.sync_mode(), SyncMode::Incremental);
    assert_eq!(stream.replication_method(), "INCREMENTAL");
    assert_eq!(stream.records_path, "$.results[*]");
}

#[test]
fn test_deals_declare_associations() {
    let catalog = builtin_catalog().unwrap();
    let deals = catalog.get("deals").unwrap();

    let targets: Vec<&str> = deals.associations.iter().map(|a| a.to.as_str()).collect();
    assert_eq!(targets, vec!["contacts", "companies"]);
    assert_eq!(
        deals.associations[0].singular_field.as_deref(),
        Some("associatedvid")
    );
}

#[test]
fn test_form_submissions_definition() {
    let catalog = builtin_catalog().unwrap();
    let stream = catalog.get("form_submissions").unwrap();

    assert!(stream.reverse_ordered);
    assert_eq!(stream.page_size, Some(50));
    assert_eq!(stream.replication_key_type, ReplicationKeyType::Integer);
    assert_eq!(stream.primary_keys, vec!["form_id", "conversionId"]);
    assert_eq!(stream.parent_stream(), Some("forms"));
}

#[test]
fn test_properties_fans_out_over_object_types() {
    let catalog = builtin_catalog().unwrap();
    let stream = catalog.get("properties").unwrap();

    match stream.partition.as_ref().unwrap() {
        PartitionConfig::List { values, field } => {
            assert_eq!(field, "object_type");
            assert_eq!(values.len(), 14);
        }
        other => panic!("Expected list partition, got {other:?}"),
    }
    assert!(stream.add_fields.contains_key("referencedObjectType"));
    assert!(!stream.is_incremental());
    assert_eq!(stream.replication_method(), "FULL_TABLE");
}

#[test]
fn test_offset_and_event_type_streams() {
    let catalog = builtin_catalog().unwrap();

    let email_events = catalog.get("email_events").unwrap();
    assert_eq!(email_events.pagination.kind(), "offset");
    let incremental = email_events.incremental.as_ref().unwrap();
    assert_eq!(incremental.start_param.as_deref(), Some("startTimestamp"));
    assert_eq!(incremental.format, DateParamFormat::EpochMillis);

    let events = catalog.get("events").unwrap();
    match &events.pagination {
        PaginationConfig::EventTypes {
            event_types_path,
            event_types_field,
            ..
        } => {
            assert_eq!(event_types_path, "/events/v3/events/event-types");
            assert_eq!(event_types_field, "eventTypes");
        }
        other => panic!("Expected event_types pagination, got {other:?}"),
    }
}

// ============================================================================
// Validation
// ============================================================================

const MINIMAL: &str = r"
name: test
streams:
  - name: owners
    path: /crm/v3/owners
    schema:
      id: string
";

#[test]
fn test_minimal_catalog_defaults() {
    let catalog = load_catalog_from_str(MINIMAL).unwrap();
    let stream = catalog.get("owners").unwrap();

    assert_eq!(catalog.version, "0.1.0");
    assert_eq!(stream.pagination, PaginationConfig::default());
    assert_eq!(stream.records_path, "$.results[*]");
    assert!(stream.primary_keys.is_empty());
    assert!(!stream.reverse_ordered);
}

#[test_case(
    "name: test\nstreams: []\n",
    "at least one stream";
    "no streams"
)]
#[test_case(
    "name: test\nstreams:\n  - {name: a, path: /a, schema: {id: string}}\n  - {name: a, path: /b, schema: {id: string}}\n",
    "Duplicate";
    "duplicate names"
)]
#[test_case(
    "name: test\nstreams:\n  - {name: a, path: /a}\n",
    "static schema or dynamic_schema";
    "no schema"
)]
#[test_case(
    "name: test\nstreams:\n  - {name: a, path: /a, schema: {id: uuid}}\n",
    "Unknown schema type";
    "bad shorthand"
)]
#[test_case(
    "name: test\nstreams:\n  - {name: a, path: /a, schema: {id: string}, reverse_ordered: true}\n",
    "reverse_ordered requires";
    "reverse without key"
)]
#[test_case(
    "name: test\nstreams:\n  - {name: a, path: /a, schema: {id: string}, partition: {type: parent, stream: b, field: b_id}}\n",
    "unknown parent stream";
    "unknown parent"
)]
#[test_case(
    "name: test\nstreams:\n  - {name: a, path: /a, schema: {id: string}, search_path: /a/search}\n",
    "search_path requires";
    "search without key"
)]
fn test_invalid_catalogs(yaml: &str, expected: &str) {
    let err = load_catalog_from_str(yaml).unwrap_err();
    assert!(
        err.to_string().contains(expected),
        "'{err}' should contain '{expected}'"
    );
}

#[test]
fn test_load_catalog_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    std::fs::write(&path, MINIMAL).unwrap();

    let catalog = load_catalog(&path).unwrap();
    assert_eq!(catalog.names(), vec!["owners"]);

    let err = load_catalog(dir.path().join("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read catalog file"));
}
