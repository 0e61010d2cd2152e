//! Tests for the Singer writer

use super::*;
use crate::engine::Message;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn lines(bytes: Vec<u8>) -> Vec<Value> {
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_schema_message_layout() {
    let mut writer = SingerWriter::new(Vec::new());
    writer
        .write(&Message::schema(
            "contacts",
            json!({"type": "object", "properties": {}}),
            vec!["id".to_string()],
            Some("lastmodifieddate"),
        ))
        .unwrap();

    let out = lines(writer.into_inner());
    assert_eq!(
        out[0],
        json!({
            "type": "SCHEMA",
            "stream": "contacts",
            "schema": {"type": "object", "properties": {}},
            "key_properties": ["id"],
            "bookmark_properties": ["lastmodifieddate"]
        })
    );
}

#[test]
fn test_full_table_schema_omits_bookmark_properties() {
    let mut writer = SingerWriter::new(Vec::new());
    writer
        .write(&Message::schema("owners", json!({}), vec!["id".to_string()], None))
        .unwrap();

    let out = lines(writer.into_inner());
    assert!(out[0].get("bookmark_properties").is_none());
}

#[test]
fn test_record_and_state_messages() {
    let mut writer = SingerWriter::new(Vec::new());
    writer
        .write(&Message::record("owners", json!({"id": "1"})))
        .unwrap();
    writer
        .write(&Message::state(json!({"bookmarks": {}})))
        .unwrap();

    assert_eq!(writer.records_written(), 1);
    assert_eq!(writer.states_written(), 1);

    let out = lines(writer.into_inner());
    assert_eq!(out[0]["type"], "RECORD");
    assert_eq!(out[0]["stream"], "owners");
    assert_eq!(out[0]["record"], json!({"id": "1"}));
    assert!(out[0]["time_extracted"].as_str().unwrap().contains('T'));
    assert_eq!(out[1], json!({"type": "STATE", "value": {"bookmarks": {}}}));
}

#[test]
fn test_vec_sink_collects_messages() {
    let mut sink: Vec<Message> = Vec::new();
    sink.emit(Message::state(json!({}))).unwrap();
    sink.emit(Message::record("users", json!({"id": "u"}))).unwrap();

    assert_eq!(sink.len(), 2);
    assert!(sink[0].is_state());
    assert_eq!(sink[1].stream(), Some("users"));
}
