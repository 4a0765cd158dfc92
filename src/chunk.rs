//! Size-bounded chunking of compressed snapshot groups.
//!
//! Storage and transport put a ceiling on per-event payload size, so a
//! compressed group that overshoots the budget is split into chunks. Each
//! chunk carries enough sequencing metadata (shared id, 0-based index, total
//! count) to be reassembled later from an unordered, duplicated or partial
//! collection.
//!
//! The bound is best-effort, not a hard cap: a single item bigger than the
//! whole budget still ships as its own over-budget chunk, because dropping
//! captured data is worse than overshooting the limit.

use serde_json::Value;
use uuid::Uuid;

use crate::compress::compress_replay_events;
use crate::error::Result;
use crate::snapshot::{
    self, byte_size, split_replay_events, ChunkedSnapshot, CompressedSnapshot, SnapshotRecord,
    GZIP_BASE64,
};

/// Default per-event payload budget (matches the ingestion pipeline's
/// message size limit).
pub const DEFAULT_MAX_SIZE_BYTES: usize = 512 * 1024;

/// Split over-budget compressed events into chunked events.
///
/// Events that already carry a chunk payload, and compressed events that fit
/// `max_size_bytes` whole, pass through unchanged - re-running the pipeline
/// over its own output is a no-op.
pub fn chunk_replay_events_by_window(
    events: Vec<Value>,
    max_size_bytes: usize,
) -> Result<Vec<Value>> {
    let mut chunked = Vec::with_capacity(events.len());
    for event in events {
        let record = SnapshotRecord::classify(snapshot::snapshot_data(&event)?);
        match record {
            SnapshotRecord::Compressed(payload) if byte_size(&payload) > max_size_bytes => {
                for chunk in split_into_chunks(&payload, max_size_bytes) {
                    chunked.push(snapshot::with_snapshot_data(
                        &event,
                        serde_json::to_value(&chunk)?,
                    ));
                }
            }
            _ => chunked.push(event),
        }
    }
    Ok(chunked)
}

/// The capture boundary: split a raw batch, compress and chunk the snapshot
/// events, and hand back the batch with non-snapshot events untouched.
///
/// Non-snapshot events keep their relative order. Applying this twice equals
/// applying it once.
pub fn preprocess_replay_events(events: Vec<Value>, max_size_bytes: usize) -> Result<Vec<Value>> {
    let (replay_events, other_events) = split_replay_events(events);
    let compressed = compress_replay_events(replay_events)?;
    let mut processed = chunk_replay_events_by_window(compressed, max_size_bytes)?;
    processed.extend(other_events);
    Ok(processed)
}

/// Greedy packer over a group's `data_items`.
///
/// Items accumulate into a chunk while the serialized item slice stays within
/// budget; the item that would overflow starts the next chunk. An item that
/// alone exceeds the budget becomes its own singleton chunk.
fn split_into_chunks(payload: &CompressedSnapshot, max_size_bytes: usize) -> Vec<ChunkedSnapshot> {
    let mut slices: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for item in &payload.data_items {
        let starts_chunk = current.is_empty();
        current.push(item.clone());
        if !starts_chunk && byte_size(&current) > max_size_bytes {
            let overflow = current.pop();
            slices.push(std::mem::take(&mut current));
            current.extend(overflow);
        }
    }
    if !current.is_empty() {
        slices.push(current);
    }

    let chunk_id = Uuid::new_v4().to_string();
    let chunk_count = slices.len() as u32;
    slices
        .into_iter()
        .enumerate()
        .map(|(index, items)| ChunkedSnapshot {
            chunk_id: chunk_id.clone(),
            chunk_index: index as u32,
            chunk_count,
            data: Value::Array(items.into_iter().map(Value::String).collect()),
            compression: Some(GZIP_BASE64.to_owned()),
            has_full_snapshot: payload.has_full_snapshot,
        })
        .collect()
}
