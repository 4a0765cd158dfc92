//! Reconstruction of original snapshot payloads from stored chunks.
//!
//! Storage hands back an unordered bag of window-tagged payloads: plain
//! records, unchunked compressed groups and chunk fragments, possibly
//! duplicated, possibly with whole chunks missing. Reassembly partitions by
//! window, regroups fragments by `chunk_id`, deduplicates, verifies
//! completeness and decompresses what can be recovered.
//!
//! # Failure semantics
//!
//! Nothing here raises for malformed input. An incomplete chunk group is
//! permanently unrecoverable from this collection, so it is dropped whole
//! (logged, not surfaced); a single corrupt item costs that one event. Empty
//! input produces an empty result with `has_next: false`.
//!
//! # Pagination
//!
//! `limit`/`offset` page over *reconstruction units* - one unchunked
//! compressed group or one chunk-id group each - in first-appearance order.
//! Plain payloads always pass through, unaffected by paging.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::compress::decompress_record;
use crate::snapshot::{ChunkedSnapshot, CompressedSnapshot, SnapshotRecord};
use crate::summary::events_summary_from_records;

/// A stored payload tagged with the window it belongs to.
#[derive(Debug, Clone)]
pub struct TaggedSnapshot {
    /// Window the payload was captured in; `None` is the no-window group.
    pub window_id: Option<String>,

    /// The raw `$snapshot_data` value as persisted.
    pub snapshot_data: Value,
}

impl TaggedSnapshot {
    pub fn new(window_id: Option<String>, snapshot_data: Value) -> Self {
        Self {
            window_id,
            snapshot_data,
        }
    }
}

/// Pagination and projection options for reassembly.
#[derive(Debug, Clone, Default)]
pub struct ReassemblyOptions {
    /// Maximum number of reconstruction units to return. `None` returns all.
    pub limit: Option<usize>,

    /// Number of reconstruction units to skip.
    pub offset: usize,

    /// Project recovered payloads down to event summaries instead of
    /// returning them whole.
    pub return_only_activity_data: bool,
}

impl ReassemblyOptions {
    /// Page over reconstruction units.
    pub fn paginated(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset,
            ..Self::default()
        }
    }

    /// Return event summaries only.
    pub fn activity_only() -> Self {
        Self {
            return_only_activity_data: true,
            ..Self::default()
        }
    }
}

/// Reconstructed events keyed by window, plus a paging flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecompressedRecording {
    /// Whether reconstruction units exist beyond `offset + limit`.
    pub has_next: bool,

    /// Recovered payloads (or summaries) per window, windows in
    /// first-appearance order.
    pub snapshot_data_by_window_id: IndexMap<Option<String>, Vec<Value>>,
}

/// One paginatable reconstruction unit, in first-appearance order.
enum Unit {
    Compressed {
        window_id: Option<String>,
        payload: CompressedSnapshot,
    },
    ChunkGroup {
        chunk_id: String,
    },
}

/// Rebuild original snapshot payloads from a window-tagged collection.
pub fn decompress_chunked_snapshot_data(
    snapshots: &[TaggedSnapshot],
    options: &ReassemblyOptions,
) -> DecompressedRecording {
    let mut result = DecompressedRecording::default();
    let mut units: Vec<Unit> = Vec::new();
    let mut chunk_groups: IndexMap<String, (Option<String>, Vec<ChunkedSnapshot>)> =
        IndexMap::new();

    for tagged in snapshots {
        match SnapshotRecord::classify(&tagged.snapshot_data) {
            SnapshotRecord::Plain(record) => {
                let output = result
                    .snapshot_data_by_window_id
                    .entry(tagged.window_id.clone())
                    .or_default();
                if options.return_only_activity_data {
                    output.extend(summaries_as_values(std::slice::from_ref(&record)));
                } else {
                    output.push(record);
                }
            }
            SnapshotRecord::Compressed(payload) => units.push(Unit::Compressed {
                window_id: tagged.window_id.clone(),
                payload,
            }),
            SnapshotRecord::Chunk(chunk) => {
                if !chunk_groups.contains_key(&chunk.chunk_id) {
                    units.push(Unit::ChunkGroup {
                        chunk_id: chunk.chunk_id.clone(),
                    });
                }
                chunk_groups
                    .entry(chunk.chunk_id.clone())
                    .or_insert_with(|| (tagged.window_id.clone(), Vec::new()))
                    .1
                    .push(chunk);
            }
            SnapshotRecord::Malformed => {
                debug!("skipping malformed snapshot payload");
            }
        }
    }

    let total = units.len();
    let selected = match options.limit {
        Some(limit) => {
            let start = options.offset.min(total);
            let end = options.offset.saturating_add(limit).min(total);
            result.has_next = options.offset.saturating_add(limit) < total;
            &units[start..end]
        }
        None => &units[options.offset.min(total)..],
    };

    for unit in selected {
        match unit {
            Unit::Compressed { window_id, payload } => {
                let records = recover_compressed(payload, options.return_only_activity_data);
                result
                    .snapshot_data_by_window_id
                    .entry(window_id.clone())
                    .or_default()
                    .extend(records);
            }
            Unit::ChunkGroup { chunk_id } => {
                let Some((window_id, chunks)) = chunk_groups.get(chunk_id) else {
                    continue;
                };
                let Some(items) = collect_group_items(chunk_id, chunks) else {
                    continue;
                };
                let records = decode_items(&items);
                let output = result
                    .snapshot_data_by_window_id
                    .entry(window_id.clone())
                    .or_default();
                if options.return_only_activity_data {
                    output.extend(summaries_as_values(&records));
                } else {
                    output.extend(records);
                }
            }
        }
    }
    result
}

/// Recover the events of an unchunked compressed group.
///
/// In activity-only mode the embedded summary is preferred when present - it
/// was computed pre-compression and makes decompression unnecessary. Legacy
/// payloads without one fall back to the full decode path.
fn recover_compressed(payload: &CompressedSnapshot, activity_only: bool) -> Vec<Value> {
    if activity_only {
        if let Some(summary) = &payload.events_summary {
            return summary
                .iter()
                .filter_map(|entry| serde_json::to_value(entry).ok())
                .collect();
        }
    }
    let records = decode_items(&payload.data_items);
    if activity_only {
        summaries_as_values(&records)
    } else {
        records
    }
}

/// Dedup, completeness check and ordered item concatenation for one chunk
/// group.
///
/// Duplicate indices collapse to the first fragment seen. Indices at or
/// above `chunk_count` are tolerated as noise; a genuinely missing index in
/// `0..chunk_count` makes the group unrecoverable and it is dropped whole.
fn collect_group_items(chunk_id: &str, chunks: &[ChunkedSnapshot]) -> Option<Vec<String>> {
    let chunk_count = chunks.first()?.chunk_count;
    let mut by_index: BTreeMap<u32, &ChunkedSnapshot> = BTreeMap::new();
    for chunk in chunks {
        by_index.entry(chunk.chunk_index).or_insert(chunk);
    }

    if (0..chunk_count).any(|index| !by_index.contains_key(&index)) {
        warn!(
            chunk_id,
            received = chunks.len(),
            expected = chunk_count,
            "dropping incomplete chunk group"
        );
        return None;
    }

    let mut items = Vec::new();
    for index in 0..chunk_count {
        let chunk = by_index.get(&index)?;
        match chunk.data.as_array() {
            Some(values) if values.iter().all(Value::is_string) => {
                items.extend(
                    values
                        .iter()
                        .filter_map(|value| value.as_str().map(str::to_owned)),
                );
            }
            _ => {
                warn!(chunk_id, index, "dropping chunk group with non-list chunk data");
                return None;
            }
        }
    }
    Some(items)
}

/// Decode a run of compressed items, skipping any that fail.
fn decode_items(items: &[String]) -> Vec<Value> {
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match decompress_record(item) {
            Ok(record) => records.push(record),
            Err(error) => warn!(%error, "skipping undecodable compressed item"),
        }
    }
    records
}

/// Summarize recovered records into JSON values for activity-only output.
fn summaries_as_values(records: &[Value]) -> Vec<Value> {
    events_summary_from_records(records)
        .into_iter()
        .filter_map(|summary| serde_json::to_value(summary).ok())
        .collect()
}
