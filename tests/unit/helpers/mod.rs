//! Shared fixtures for replaykit tests.

#![allow(dead_code)]

use replaykit::TaggedSnapshot;
use serde_json::{json, Value};

/// 2019-01-01T00:00:00Z in epoch milliseconds.
pub const MILLISECOND_TIMESTAMP: i64 = 1_546_300_800_000;

/// Build a `$snapshot` capture event the way clients send them.
pub fn snapshot_event(session_id: &str, window_id: Option<&str>, snapshot_data: Value) -> Value {
    let mut properties = json!({
        "$session_id": session_id,
        "$snapshot_data": snapshot_data,
        "distinct_id": "abc123",
    });
    if let Some(window_id) = window_id {
        properties["$window_id"] = json!(window_id);
    }
    json!({"event": "$snapshot", "properties": properties})
}

/// The two-record fixture used throughout: one full snapshot, one diff.
pub fn raw_snapshot_events() -> Vec<Value> {
    vec![
        snapshot_event(
            "1234",
            Some("1"),
            json!({"type": 2, "timestamp": MILLISECOND_TIMESTAMP}),
        ),
        snapshot_event(
            "1234",
            Some("1"),
            json!({"type": 3, "timestamp": MILLISECOND_TIMESTAMP}),
        ),
    ]
}

/// Pull every event's `$snapshot_data` out of a processed batch.
pub fn snapshot_data_list(events: &[Value]) -> Vec<Value> {
    events
        .iter()
        .map(|event| event["properties"]["$snapshot_data"].clone())
        .collect()
}

/// Tag a list of payloads with one window id, as storage would return them.
pub fn tag_all(window_id: Option<&str>, payloads: Vec<Value>) -> Vec<TaggedSnapshot> {
    payloads
        .into_iter()
        .map(|payload| TaggedSnapshot::new(window_id.map(str::to_owned), payload))
        .collect()
}

/// Tag each processed event's payload with the window id it carries.
pub fn tag_by_event_window(events: &[Value]) -> Vec<TaggedSnapshot> {
    events
        .iter()
        .map(|event| {
            let window_id = event["properties"]["$window_id"]
                .as_str()
                .map(str::to_owned);
            TaggedSnapshot::new(window_id, event["properties"]["$snapshot_data"].clone())
        })
        .collect()
}
