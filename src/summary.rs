//! Lossy event summaries and activity classification.
//!
//! A full rrweb snapshot record can be hundreds of kilobytes; activity
//! analysis only needs its type, timestamp and a handful of `data` fields.
//! [`EventSummary`] is that projection, cheap enough to store alongside the
//! compressed payload so timeline views never pay for a full decompression.
//!
//! The copied `data` fields are driven by static allow-lists rather than
//! per-field conditionals, so the retained surface stays auditable in one
//! place.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// rrweb event type for a complete DOM snapshot.
pub const FULL_SNAPSHOT_TYPE: i64 = 2;

/// rrweb event type for an incremental DOM diff.
pub const INCREMENTAL_SNAPSHOT_TYPE: i64 = 3;

/// Incremental sources that carry no user intent. Mutation (source 0) fires
/// on DOM churn whether or not anyone is at the keyboard; every other
/// reported source implies a user did something.
const INACTIVITY_EXEMPT_SOURCES: &[i64] = &[0];

/// Keys copied from a record's `data` object into its summary.
pub const SUMMARY_DATA_KEYS: &[&str] = &[
    "source", "type", "href", "width", "height", "tag", "plugin", "payload",
];

/// Keys retained inside a summarized `payload` mapping.
pub const SUMMARY_PAYLOAD_KEYS: &[&str] = &["href", "level"];

/// A lossy projection of one rrweb record, used for activity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event timestamp in epoch milliseconds.
    pub timestamp: i64,

    /// rrweb event type code.
    #[serde(rename = "type")]
    pub event_type: i64,

    /// Allow-listed subset of the record's `data` object.
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Whether a raw rrweb record is a full DOM snapshot (as opposed to an
/// incremental diff).
pub fn is_full_snapshot(record: &Value) -> bool {
    record.get("type").and_then(Value::as_i64) == Some(FULL_SNAPSHOT_TYPE)
}

/// Whether a summarized event represents user activity.
///
/// Only incremental snapshots count, and only when they report a source that
/// is not in the inactivity-exempt set. A summary with no `source` (or a
/// non-numeric one) is inactive.
pub fn is_active_event(summary: &EventSummary) -> bool {
    if summary.event_type != INCREMENTAL_SNAPSHOT_TYPE {
        return false;
    }
    match summary.data.get("source").and_then(Value::as_i64) {
        Some(source) => !INACTIVITY_EXEMPT_SOURCES.contains(&source),
        None => false,
    }
}

/// Build summaries for a batch of raw rrweb records.
///
/// Elements missing either `type` or `timestamp`, or whose timestamp parses
/// as neither an epoch-millisecond number nor an RFC 3339 string, are skipped
/// silently - one bad client record must never take down the batch. The
/// result keeps input order; callers that need chronological order sort by
/// `timestamp` themselves (every retained timestamp is numeric, so that sort
/// cannot fail).
pub fn events_summary_from_records(records: &[Value]) -> Vec<EventSummary> {
    let mut summaries = Vec::with_capacity(records.len());
    for record in records {
        let Some(event_type) = record.get("type").and_then(Value::as_i64) else {
            continue;
        };
        let Some(raw_timestamp) = record.get("timestamp") else {
            continue;
        };
        let Some(timestamp) = parse_timestamp_millis(raw_timestamp) else {
            continue;
        };
        let data = match record.get("data").and_then(Value::as_object) {
            Some(data) => filter_summary_data(data),
            None => Map::new(),
        };
        summaries.push(EventSummary {
            timestamp,
            event_type,
            data,
        });
    }
    summaries
}

/// Parse a wire timestamp into epoch milliseconds.
///
/// Clients normally send epoch-millisecond numbers, but some emit ISO-8601
/// strings; anything else is unusable.
pub(crate) fn parse_timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|parsed| parsed.timestamp_millis()),
        _ => None,
    }
}

/// Allow-listed copy of a record's `data` object.
///
/// `payload` gets a second-level filter and only survives when it is itself a
/// keyed mapping - console plugins ship list payloads holding full event
/// bodies, which is exactly the weight this projection exists to shed.
fn filter_summary_data(data: &Map<String, Value>) -> Map<String, Value> {
    let mut filtered = Map::new();
    for &key in SUMMARY_DATA_KEYS {
        let Some(value) = data.get(key) else { continue };
        if key == "payload" {
            if let Some(payload) = value.as_object() {
                let kept: Map<String, Value> = payload
                    .iter()
                    .filter(|(payload_key, _)| {
                        SUMMARY_PAYLOAD_KEYS.contains(&payload_key.as_str())
                    })
                    .map(|(payload_key, payload_value)| {
                        (payload_key.clone(), payload_value.clone())
                    })
                    .collect();
                filtered.insert(key.to_owned(), Value::Object(kept));
            }
        } else {
            filtered.insert(key.to_owned(), value.clone());
        }
    }
    filtered
}
