//! Round-trip law: reassembly inverts the capture pipeline.

use proptest::prelude::*;
use replaykit::{
    byte_size, compress_replay_events, decompress_chunked_snapshot_data, preprocess_replay_events,
    ReassemblyOptions,
};
use serde_json::{json, Value};

use crate::helpers::{raw_snapshot_events, snapshot_data_list, snapshot_event, tag_all};

fn reassembled_payloads(chunk_budget: usize) -> Vec<Value> {
    let processed = preprocess_replay_events(raw_snapshot_events(), chunk_budget).unwrap();
    let tagged = tag_all(Some("abc123"), snapshot_data_list(&processed));
    let result = decompress_chunked_snapshot_data(&tagged, &ReassemblyOptions::default());
    result.snapshot_data_by_window_id[&Some("abc123".to_owned())].clone()
}

#[test]
fn roundtrip_at_generous_and_tight_budgets() {
    let original = snapshot_data_list(&raw_snapshot_events());
    for budget in [1, 50, 100, 400, 1000, 1 << 20] {
        assert_eq!(reassembled_payloads(budget), original, "budget {budget}");
    }
}

#[test]
fn tight_budget_produces_more_events_than_generous() {
    let generous = preprocess_replay_events(raw_snapshot_events(), 1000).unwrap();
    let tight = preprocess_replay_events(raw_snapshot_events(), 100).unwrap();
    assert_eq!(generous.len(), 1);
    assert!(tight.len() > 1);
}

#[test]
fn compressed_event_size_is_probeable() {
    let compressed = compress_replay_events(raw_snapshot_events()).unwrap();
    assert_eq!(compressed.len(), 1);
    // External policy code sizes budgets off this probe; it must match the
    // serialized form exactly.
    assert_eq!(
        byte_size(&compressed[0]),
        serde_json::to_vec(&compressed[0]).unwrap().len()
    );
}

fn arb_record() -> impl Strategy<Value = Value> {
    (
        0i64..8,
        0i64..2_000_000_000_000,
        prop::option::of(0i64..14),
        "[a-z]{0,24}",
    )
        .prop_map(|(event_type, timestamp, source, text)| {
            let mut data = json!({"text": text});
            if let Some(source) = source {
                data["source"] = json!(source);
            }
            json!({"type": event_type, "timestamp": timestamp, "data": data})
        })
}

proptest! {
    // The chunker never drops data, whatever the budget: an over-budget item
    // ships as an over-budget singleton chunk rather than vanishing.
    #[test]
    fn roundtrip_reconstructs_any_batch(
        records in prop::collection::vec(arb_record(), 1..16),
        budget in 1usize..4096,
    ) {
        let events: Vec<Value> = records
            .iter()
            .map(|record| snapshot_event("s1", Some("w1"), record.clone()))
            .collect();

        let processed = preprocess_replay_events(events, budget).unwrap();
        let tagged = tag_all(Some("w1"), snapshot_data_list(&processed));
        let result = decompress_chunked_snapshot_data(&tagged, &ReassemblyOptions::default());

        prop_assert_eq!(
            &result.snapshot_data_by_window_id[&Some("w1".to_owned())],
            &records
        );
    }

    #[test]
    fn pipeline_is_idempotent_for_any_budget(
        records in prop::collection::vec(arb_record(), 1..8),
        budget in 1usize..2048,
    ) {
        let events: Vec<Value> = records
            .iter()
            .map(|record| snapshot_event("s1", Some("w1"), record.clone()))
            .collect();

        let once = preprocess_replay_events(events, budget).unwrap();
        let twice = preprocess_replay_events(once.clone(), budget).unwrap();
        prop_assert_eq!(twice, once);
    }
}
