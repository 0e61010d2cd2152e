//! Replication bookmarks
//!
//! HubSpot mixes two representations for replication keys: ISO-8601
//! datetimes (`updatedAt`, `lastmodifieddate`) and integer epoch
//! milliseconds (`submittedAt`, `occurredAt` on legacy endpoints). A stored
//! bookmark may be in either form regardless of the stream, so everything
//! here accepts both and normalizes on demand.

use crate::error::{Error, Result};
use crate::types::{JsonValue, ReplicationKeyType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A replication-key value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bookmark {
    /// Epoch milliseconds
    Millis(i64),
    /// Textual value, usually an ISO-8601 datetime
    Text(String),
}

impl Bookmark {
    /// Epoch milliseconds for this value, if it can be interpreted as a date
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Bookmark::Millis(ms) => Some(*ms),
            Bookmark::Text(s) => convert_date_to_epoch(&JsonValue::String(s.clone())).ok(),
        }
    }

    /// RFC 3339 rendering, if this value can be interpreted as a date
    pub fn to_iso(&self) -> Option<String> {
        let ms = self.as_millis()?;
        let dt = Utc.timestamp_millis_opt(ms).single()?;
        Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Value as written to the state file
    pub fn to_json(&self) -> JsonValue {
        match self {
            Bookmark::Millis(ms) => JsonValue::from(*ms),
            Bookmark::Text(s) => JsonValue::String(s.clone()),
        }
    }

    /// Build from a record or state value. Non-scalar values are rejected.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Bookmark::Millis),
            JsonValue::String(s) if !s.is_empty() => Some(Bookmark::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bookmark::Millis(ms) => write!(f, "{ms}"),
            Bookmark::Text(s) => f.write_str(s),
        }
    }
}

/// Convert a date value to epoch milliseconds.
///
/// Accepts integers (returned unchanged), integer-looking strings, bare
/// dates (`2024-07-01`, midnight UTC), naive datetimes (treated as UTC) and
/// RFC 3339 datetimes with `Z` or an explicit offset.
pub fn convert_date_to_epoch(value: &JsonValue) -> Result<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| bookmark_error(value, "number out of range")),
        JsonValue::String(s) => parse_date_str(s.trim())
            .ok_or_else(|| bookmark_error(value, "not an ISO-8601 date or epoch")),
        _ => Err(bookmark_error(value, "expected a string or integer")),
    }
}

fn bookmark_error(value: &JsonValue, message: &str) -> Error {
    Error::Bookmark {
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn parse_date_str(s: &str) -> Option<i64> {
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }
    parse_datetime(s).map(|dt| dt.timestamp_millis())
}

/// Parse an ISO-8601 date or datetime as UTC
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Tracks the running maximum replication-key value of one stream or
/// partition during a sync.
#[derive(Debug, Clone)]
pub struct BookmarkTracker {
    key_type: ReplicationKeyType,
    start: Option<Bookmark>,
    current: Option<Bookmark>,
}

impl BookmarkTracker {
    /// Create a tracker seeded with the starting value of this run
    pub fn new(key_type: ReplicationKeyType, start: Option<Bookmark>) -> Self {
        Self {
            key_type,
            current: start.clone(),
            start,
        }
    }

    /// Resolve the starting value of a run from a stored bookmark and the
    /// configured `start_date`.
    ///
    /// Order: a stored string parsed as ISO-8601 into epoch ms; then an
    /// integer pass-through (integer value or integer string); then
    /// `start_date`; then the stored value as received.
    pub fn starting_value(stored: Option<&JsonValue>, start_date: Option<&str>) -> Option<Bookmark> {
        if let Some(JsonValue::String(s)) = stored {
            if let Some(dt) = parse_datetime(s.trim()) {
                return Some(Bookmark::Millis(dt.timestamp_millis()));
            }
        }

        match stored {
            Some(JsonValue::Number(n)) => {
                if let Some(ms) = n.as_i64() {
                    return Some(Bookmark::Millis(ms));
                }
            }
            Some(JsonValue::String(s)) => {
                if let Ok(ms) = s.trim().parse::<i64>() {
                    return Some(Bookmark::Millis(ms));
                }
            }
            _ => {}
        }

        if let Some(start) = start_date.filter(|s| !s.is_empty()) {
            return Some(
                parse_date_str(start)
                    .map(Bookmark::Millis)
                    .unwrap_or_else(|| Bookmark::Text(start.to_string())),
            );
        }

        stored.and_then(Bookmark::from_json)
    }

    /// Starting value of this run
    pub fn start(&self) -> Option<&Bookmark> {
        self.start.as_ref()
    }

    /// Highest value seen so far (or the starting value)
    pub fn current(&self) -> Option<&Bookmark> {
        self.current.as_ref()
    }

    /// Declared type of the replication key
    pub fn key_type(&self) -> ReplicationKeyType {
        self.key_type
    }

    /// Current value as written to the state file: RFC 3339 for datetime
    /// keys, epoch milliseconds for integer keys
    pub fn state_value(&self) -> Option<JsonValue> {
        let current = self.current.as_ref()?;
        Some(match (self.key_type, current) {
            (ReplicationKeyType::DateTime, Bookmark::Millis(_)) => current
                .to_iso()
                .map_or_else(|| current.to_json(), JsonValue::String),
            _ => current.to_json(),
        })
    }

    /// Offer a record's replication-key value. Returns true when it extends
    /// the bookmark.
    pub fn observe(&mut self, value: &JsonValue) -> bool {
        let Some(candidate) = Bookmark::from_json(value) else {
            return false;
        };

        let extends = match &self.current {
            None => true,
            Some(current) => self.compare(&candidate, current) != Ordering::Less,
        };

        if extends {
            self.current = Some(match self.key_type {
                ReplicationKeyType::Integer => candidate
                    .as_millis()
                    .map(Bookmark::Millis)
                    .unwrap_or(candidate),
                ReplicationKeyType::DateTime => candidate,
            });
        }
        extends
    }

    /// Whether a record value predates the starting value of this run
    pub fn is_before_start(&self, value: &JsonValue) -> bool {
        let (Some(start), Some(candidate)) = (&self.start, Bookmark::from_json(value)) else {
            return false;
        };
        match (candidate.as_millis(), start.as_millis()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    fn compare(&self, a: &Bookmark, b: &Bookmark) -> Ordering {
        match self.key_type {
            ReplicationKeyType::Integer => match (a.as_millis(), b.as_millis()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
            ReplicationKeyType::DateTime => match (a, b) {
                (Bookmark::Text(x), Bookmark::Text(y)) => {
                    match (parse_datetime(x), parse_datetime(y)) {
                        (Some(dx), Some(dy)) => dx.cmp(&dy),
                        _ => x.cmp(y),
                    }
                }
                _ => match (a.as_millis(), b.as_millis()) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    _ => a.to_string().cmp(&b.to_string()),
                },
            },
        }
    }
}
