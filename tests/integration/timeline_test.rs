//! End-to-end timeline derivation: capture -> reassemble -> segment.

use chrono::{DateTime, Duration, TimeZone, Utc};
use indexmap::IndexMap;
use replaykit::{
    decompress_chunked_snapshot_data, generate_inactive_segments_for_range,
    get_active_segments_from_event_list, preprocess_replay_events, EventSummary,
    ReassemblyOptions, RecordingSegment, DEFAULT_MAX_SIZE_BYTES,
};
use serde_json::{json, Value};

use crate::helpers::{snapshot_data_list, snapshot_event, tag_all};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()
}

fn activity_record(offset_seconds: i64, active: bool) -> Value {
    let timestamp = (base_time() + Duration::seconds(offset_seconds)).timestamp_millis();
    let data = if active { json!({"source": 2}) } else { json!({}) };
    json!({"type": 3, "timestamp": timestamp, "data": data})
}

#[test]
fn active_segments_derive_from_reassembled_activity_data() {
    let offsets = [
        (0, false),
        (10, true),
        (10, true),
        (40, true),
        (60, false),
        (100, false),
        (110, true),
        (120, false),
        (170, true),
        (180, true),
        (200, false),
    ];
    let events: Vec<Value> = offsets
        .iter()
        .map(|&(offset, active)| {
            snapshot_event("1234", Some("1"), activity_record(offset, active))
        })
        .collect();

    // Through the whole pipeline: compress, chunk, reassemble summaries.
    let processed = preprocess_replay_events(events, DEFAULT_MAX_SIZE_BYTES).unwrap();
    let tagged = tag_all(Some("1"), snapshot_data_list(&processed));
    let result = decompress_chunked_snapshot_data(&tagged, &ReassemblyOptions::activity_only());

    let summaries: Vec<EventSummary> = result.snapshot_data_by_window_id[&Some("1".to_owned())]
        .iter()
        .map(|value| serde_json::from_value(value.clone()).unwrap())
        .collect();

    let segments = get_active_segments_from_event_list(&summaries, Some("1"), 60);
    assert_eq!(
        segments,
        vec![
            RecordingSegment {
                start_time: base_time() + Duration::seconds(10),
                end_time: base_time() + Duration::seconds(40),
                window_id: Some("1".to_owned()),
                is_active: true,
            },
            RecordingSegment {
                start_time: base_time() + Duration::seconds(110),
                end_time: base_time() + Duration::seconds(180),
                window_id: Some("1".to_owned()),
                is_active: true,
            },
        ]
    );
}

#[test]
fn gap_fill_composes_with_active_segments_into_one_timeline() {
    // Window "1" was active early, window "2" late; the quiet stretch in
    // between is filled against both windows' overall recording spans.
    let window_one_events: Vec<EventSummary> = [0, 10, 20]
        .iter()
        .map(|&offset| {
            serde_json::from_value(activity_record(offset, true)).unwrap()
        })
        .collect();
    let window_two_events: Vec<EventSummary> = [200, 210]
        .iter()
        .map(|&offset| {
            serde_json::from_value(activity_record(offset, true)).unwrap()
        })
        .collect();

    let active_one = get_active_segments_from_event_list(&window_one_events, Some("1"), 60);
    let active_two = get_active_segments_from_event_list(&window_two_events, Some("2"), 60);
    assert_eq!(active_one.len(), 1);
    assert_eq!(active_two.len(), 1);

    let mut recorded_spans = IndexMap::new();
    recorded_spans.insert(Some("1".to_owned()), active_one[0].clone());
    recorded_spans.insert(Some("2".to_owned()), active_two[0].clone());

    let fillers = generate_inactive_segments_for_range(
        active_one[0].end_time,
        active_two[0].start_time,
        Some("1"),
        &recorded_spans,
        false,
    );

    // Neither window recorded between 20s and 200s: one filler spans the
    // whole gap, attributed to the window that was last on screen.
    let millisecond = Duration::milliseconds(1);
    assert_eq!(
        fillers,
        vec![RecordingSegment {
            start_time: active_one[0].end_time + millisecond,
            end_time: active_two[0].start_time - millisecond,
            window_id: Some("1".to_owned()),
            is_active: false,
        }]
    );
}
