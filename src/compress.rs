//! Gzip-base64 compression of grouped snapshot events.
//!
//! Each raw rrweb record is serialized, gzipped and base64-encoded on its
//! own, so a group's `data_items` can later be sliced at item boundaries by
//! the chunker and decoded item by item during reassembly - one corrupt item
//! costs one event, not the group.
//!
//! Compression is deterministic for identical input order: grouping keeps
//! first-appearance order of `(session, window)` keys and arrival order
//! within a group.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{DecodeError, Result};
use crate::snapshot::{self, CompressedSnapshot, SnapshotRecord, GZIP_BASE64};
use crate::summary::{events_summary_from_records, is_full_snapshot};

/// Compress one snapshot record into a gzip-base64 string.
pub fn compress_record(record: &Value) -> Result<String> {
    let serialized = serde_json::to_vec(record)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serialized)?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

/// Decode one gzip-base64 item back into its original record.
///
/// A malformed blob yields a [`DecodeError`]; callers treat that as "skip
/// this element", never as a batch failure.
pub fn decompress_record(item: &str) -> std::result::Result<Value, DecodeError> {
    let compressed = BASE64.decode(item)?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut serialized = Vec::new();
    decoder.read_to_end(&mut serialized)?;
    Ok(serde_json::from_slice(&serialized)?)
}

/// Collapse raw snapshot events into one compressed event per
/// `(session, window)` group.
///
/// The group's event envelope (session, window, distinct id) is taken from
/// its first event; `$snapshot_data` becomes a [`CompressedSnapshot`] with
/// per-record items, a `has_full_snapshot` flag and pre-computed, timestamp-
/// sorted event summaries.
///
/// Events whose payload is already compressed or chunked pass through
/// unchanged, which is what makes the capture pipeline idempotent over its
/// own output.
pub fn compress_replay_events(events: Vec<Value>) -> Result<Vec<Value>> {
    let mut passthrough = Vec::new();
    let mut groups: IndexMap<(String, Option<String>), Vec<Value>> = IndexMap::new();

    for event in events {
        let record = SnapshotRecord::classify(snapshot::snapshot_data(&event)?);
        match record {
            SnapshotRecord::Plain(_) => {
                let key = (
                    snapshot::session_id(&event)?.to_owned(),
                    snapshot::window_id(&event),
                );
                groups.entry(key).or_default().push(event);
            }
            // Already processed on an earlier pass, or opaque: leave as-is.
            _ => passthrough.push(event),
        }
    }

    let mut compressed_events = Vec::with_capacity(groups.len() + passthrough.len());
    for (_, group) in groups {
        let records = group
            .iter()
            .map(|event| snapshot::snapshot_data(event).cloned())
            .collect::<Result<Vec<Value>>>()?;
        let data_items = records
            .iter()
            .map(compress_record)
            .collect::<Result<Vec<String>>>()?;
        let mut events_summary = events_summary_from_records(&records);
        events_summary.sort_by_key(|summary| summary.timestamp);

        let payload = CompressedSnapshot {
            compression: GZIP_BASE64.to_owned(),
            data_items,
            has_full_snapshot: records.iter().any(is_full_snapshot),
            events_summary: Some(events_summary),
        };
        compressed_events.push(snapshot::with_snapshot_data(
            &group[0],
            serde_json::to_value(&payload)?,
        ));
    }
    compressed_events.extend(passthrough);
    Ok(compressed_events)
}
