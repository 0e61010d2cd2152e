//! Tests for partition module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_partition_value_accessors() {
    let pv = PartitionValue::new("f-1")
        .with_value("form_id", "f-1")
        .with_value("portal", 42);

    assert_eq!(pv.get_string("form_id"), Some("f-1"));
    assert_eq!(pv.get("portal"), Some(&json!(42)));
    assert_eq!(pv.to_json(), json!({"form_id": "f-1", "portal": 42}));
}

#[test]
fn test_list_router() {
    let router = ListRouter::new(
        vec!["ticket".to_string(), "deal".to_string()],
        "object_type",
    );
    let partitions = router.partitions().unwrap();

    assert_eq!(router.partition_field(), "object_type");
    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].id, "ticket");
    assert_eq!(partitions[1].get_string("object_type"), Some("deal"));
}

#[test]
fn test_parent_router_dedupes_and_skips_missing_keys() {
    let parents = vec![
        json!({"id": "a", "name": "Form A"}),
        json!({"name": "no id"}),
        json!({"id": "b"}),
        json!({"id": "a"}),
        json!({"id": 7}),
    ];
    let router = ParentRouter::new(parents, "id", "form_id");
    let ids: Vec<String> = router
        .partitions()
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(ids, vec!["a", "b", "7"]);
}

#[test]
fn test_parent_router_nested_key() {
    let router = ParentRouter::new(vec![json!({"data": {"guid": "g1"}})], "data.guid", "guid");
    let partitions = router.partitions().unwrap();
    assert_eq!(partitions[0].get_string("guid"), Some("g1"));
}

#[test]
fn test_partition_config_from_yaml() {
    let list: PartitionConfig = serde_yaml::from_str(
        "type: list\nvalues: [ticket, deal]\nfield: object_type\n",
    )
    .unwrap();
    assert_eq!(list.field(), "object_type");

    let parent: PartitionConfig =
        serde_yaml::from_str("type: parent\nstream: forms\nfield: form_id\n").unwrap();
    assert_eq!(
        parent,
        PartitionConfig::Parent {
            stream: "forms".to_string(),
            key: "id".to_string(),
            field: "form_id".to_string(),
        }
    );
}
