//! Request and record shaping
//!
//! Pure helpers of the engine: page query parameters, CRM search bodies and
//! per-record post-processing.

use crate::error::{Error, Result};
use crate::pagination::SEARCH_PAGE_SIZE;
use crate::state::{convert_date_to_epoch, Bookmark};
use crate::template::{self, TemplateContext};
use crate::types::{DateParamFormat, JsonValue};
use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::json;
use std::collections::BTreeMap;

/// Render a date bound in the format a stream expects
pub fn format_date_param(value: &Bookmark, format: DateParamFormat) -> Result<String> {
    let millis = value.as_millis().ok_or_else(|| Error::Bookmark {
        value: value.to_string(),
        message: "not a date".to_string(),
    })?;

    match format {
        DateParamFormat::EpochMillis => Ok(millis.to_string()),
        DateParamFormat::Iso8601 => Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .ok_or_else(|| Error::Bookmark {
                value: millis.to_string(),
                message: "timestamp out of range".to_string(),
            }),
    }
}

/// Render a configured date (`start_date`, `end_date`) as a bound
pub fn format_config_date(value: &str, format: DateParamFormat) -> Result<String> {
    let millis = convert_date_to_epoch(&JsonValue::String(value.to_string()))?;
    format_date_param(&Bookmark::Millis(millis), format)
}

/// Body of a CRM search request.
///
/// Records with `replication_key >= anchor_millis`, ascending, at most one
/// page, with the discovered properties. `after` continues the same query.
pub fn search_body(
    replication_key: &str,
    anchor_millis: i64,
    after: Option<u64>,
    properties: &[String],
) -> JsonValue {
    let mut body = json!({
        "filterGroups": [{
            "filters": [{
                "propertyName": replication_key,
                "operator": "GTE",
                "value": anchor_millis.to_string(),
            }]
        }],
        "sorts": [{
            "propertyName": replication_key,
            "direction": "ASCENDING",
        }],
        "limit": SEARCH_PAGE_SIZE,
        "properties": properties,
    });

    if let (Some(after), Some(obj)) = (after, body.as_object_mut()) {
        obj.insert("after".to_string(), JsonValue::String(after.to_string()));
    }
    body
}

/// Copy the replication key from `properties` to the top level of a CRM
/// record. Records without it get `null`.
pub fn lift_replication_key(record: &mut JsonValue, replication_key: &str) {
    let value = record
        .get("properties")
        .and_then(|props| props.get(replication_key))
        .cloned()
        .unwrap_or(JsonValue::Null);

    if let Some(obj) = record.as_object_mut() {
        obj.insert(replication_key.to_string(), value);
    }
}

/// Add rendered template fields to a record
pub fn add_fields(
    record: &mut JsonValue,
    fields: &BTreeMap<String, String>,
    ctx: &TemplateContext,
) -> Result<()> {
    let Some(obj) = record.as_object_mut() else {
        return Ok(());
    };
    for (name, value) in fields {
        obj.insert(name.clone(), template::render_value(value, ctx)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(DateParamFormat::EpochMillis, "1719835200000")]
    #[test_case(DateParamFormat::Iso8601, "2024-07-01T12:00:00.000Z")]
    fn test_format_config_date(format: DateParamFormat, expected: &str) {
        assert_eq!(format_config_date("2024-07-01T12:00:00", format).unwrap(), expected);
    }

    #[test]
    fn test_format_date_param_rejects_text() {
        let err = format_date_param(&Bookmark::Text("yesterday".to_string()), DateParamFormat::EpochMillis)
            .unwrap_err();
        assert!(matches!(err, Error::Bookmark { .. }));
    }

    #[test]
    fn test_search_body_first_page() {
        let body = search_body(
            "hs_lastmodifieddate",
            1_719_792_000_000,
            None,
            &["dealname".to_string(), "amount".to_string()],
        );

        assert_eq!(
            body,
            json!({
                "filterGroups": [{"filters": [{
                    "propertyName": "hs_lastmodifieddate",
                    "operator": "GTE",
                    "value": "1719792000000"
                }]}],
                "sorts": [{"propertyName": "hs_lastmodifieddate", "direction": "ASCENDING"}],
                "limit": 100,
                "properties": ["dealname", "amount"]
            })
        );
    }

    #[test]
    fn test_search_body_continuation() {
        let body = search_body("lastmodifieddate", 0, Some(200), &[]);
        assert_eq!(body["after"], json!("200"));
    }

    #[test]
    fn test_lift_replication_key() {
        let mut record = json!({"id": "1", "properties": {"hs_lastmodifieddate": "2024-07-01T00:00:00Z"}});
        lift_replication_key(&mut record, "hs_lastmodifieddate");
        assert_eq!(record["hs_lastmodifieddate"], json!("2024-07-01T00:00:00Z"));

        let mut record = json!({"id": "2", "properties": {}});
        lift_replication_key(&mut record, "hs_lastmodifieddate");
        assert_eq!(record["hs_lastmodifieddate"], JsonValue::Null);

        let mut record = json!({"id": "3"});
        lift_replication_key(&mut record, "lastmodifieddate");
        assert_eq!(record["lastmodifieddate"], JsonValue::Null);
    }

    #[test]
    fn test_add_fields() {
        let ctx = TemplateContext::new().for_partition(json!({"object_type": "deal"}));
        let fields = BTreeMap::from([(
            "referencedObjectType".to_string(),
            "{{ partition.object_type }}".to_string(),
        )]);

        let mut record = json!({"name": "amount"});
        add_fields(&mut record, &fields, &ctx).unwrap();
        assert_eq!(record, json!({"name": "amount", "referencedObjectType": "deal"}));
    }
}
