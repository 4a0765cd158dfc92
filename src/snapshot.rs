//! Snapshot payload model, wire-shape classification and the byte-size probe.
//!
//! Capture batches are loosely typed JSON; this module is the single place
//! that decides what shape a `$snapshot_data` value actually has. Everything
//! downstream works with [`SnapshotRecord`] instead of sniffing keys ad hoc.
//!
//! # Wire shapes
//!
//! ```text
//! {"type":2,"timestamp":1546300800000,"data":{...}}        <- plain rrweb record
//! {"compression":"gzip-base64","data_items":[...],...}     <- compressed group
//! {"chunk_id":"...","chunk_index":0,"chunk_count":3,...}   <- one chunk of a split
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::summary::EventSummary;

/// Event name carrying session-replay snapshot payloads.
pub const SNAPSHOT_EVENT: &str = "$snapshot";

/// Compression scheme marker written into compressed payloads.
pub const GZIP_BASE64: &str = "gzip-base64";

/// Property key holding the session identifier.
pub const SESSION_ID_KEY: &str = "$session_id";

/// Property key holding the browser window identifier. Absent on events from
/// clients predating multi-window capture; those group under the no-window
/// sentinel, distinct from any named window.
pub const WINDOW_ID_KEY: &str = "$window_id";

/// Property key holding the snapshot payload itself.
pub const SNAPSHOT_DATA_KEY: &str = "$snapshot_data";

/// An unchunked compressed event group.
///
/// Produced when a whole `(session, window)` group fits the size budget in
/// one piece. `data_items` holds one gzip-base64 string per original record,
/// in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedSnapshot {
    /// Compression scheme for every item (currently always `gzip-base64`).
    pub compression: String,

    /// One compressed serialized record per original event.
    pub data_items: Vec<String>,

    /// Whether any contained record is a full DOM snapshot.
    #[serde(default)]
    pub has_full_snapshot: bool,

    /// Summaries computed pre-compression, sorted by timestamp. Lets
    /// activity analysis skip decompression entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_summary: Option<Vec<EventSummary>>,
}

/// One fragment of a size-bounded split of a compressed group.
///
/// All fragments of one split share a `chunk_id`; `chunk_index` orders them
/// and `chunk_count` says how many exist. A group is only decodable once
/// every index in `0..chunk_count` has been seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkedSnapshot {
    /// Identifier shared by every chunk of one split.
    pub chunk_id: String,

    /// 0-based position of this chunk within the split.
    pub chunk_index: u32,

    /// Total number of chunks the split produced.
    pub chunk_count: u32,

    /// Slice of the group's `data_items`. Kept loose so a damaged fragment
    /// still groups by id; the reassembler validates it is an array of
    /// strings before decoding.
    pub data: Value,

    /// Compression scheme of the carried items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,

    /// Whether the originating group contained a full DOM snapshot.
    #[serde(default)]
    pub has_full_snapshot: bool,
}

/// The shapes a `$snapshot_data` value can take, discriminated by key
/// presence rather than runtime sniffing scattered through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotRecord {
    /// An uncompressed rrweb record, passed through untouched.
    Plain(Value),

    /// An unchunked compressed group.
    Compressed(CompressedSnapshot),

    /// One chunk of a split group.
    Chunk(ChunkedSnapshot),

    /// Claims to be compressed or chunked but the envelope does not parse.
    Malformed,
}

impl SnapshotRecord {
    /// Classify a raw `$snapshot_data` value by shape.
    pub fn classify(value: &Value) -> SnapshotRecord {
        match value.as_object() {
            Some(map) if map.contains_key("chunk_id") => {
                match serde_json::from_value(value.clone()) {
                    Ok(chunk) => SnapshotRecord::Chunk(chunk),
                    Err(_) => SnapshotRecord::Malformed,
                }
            }
            Some(map) if map.contains_key("data_items") => {
                match serde_json::from_value(value.clone()) {
                    Ok(compressed) => SnapshotRecord::Compressed(compressed),
                    Err(_) => SnapshotRecord::Malformed,
                }
            }
            _ => SnapshotRecord::Plain(value.clone()),
        }
    }
}

/// Whether a capture event carries session-replay snapshot data.
pub fn is_snapshot_event(event: &Value) -> bool {
    event.get("event").and_then(Value::as_str) == Some(SNAPSHOT_EVENT)
}

/// Split a capture batch into snapshot events and everything else.
///
/// Both sides preserve their relative input order.
pub fn split_replay_events(events: Vec<Value>) -> (Vec<Value>, Vec<Value>) {
    events.into_iter().partition(is_snapshot_event)
}

/// Session id of a snapshot event. A `$snapshot` event without one is a
/// client bug worth failing loudly on.
pub fn session_id(event: &Value) -> Result<&str> {
    event
        .pointer("/properties/$session_id")
        .and_then(Value::as_str)
        .ok_or(Error::MissingSessionId)
}

/// Window id of a snapshot event, if the client reported one.
pub fn window_id(event: &Value) -> Option<String> {
    event
        .pointer("/properties/$window_id")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// The `$snapshot_data` payload of a snapshot event.
pub fn snapshot_data(event: &Value) -> Result<&Value> {
    event
        .pointer("/properties/$snapshot_data")
        .ok_or(Error::MissingSnapshotData)
}

/// Clone an event with its `$snapshot_data` replaced, leaving every other
/// property (session, window, distinct id, extras) intact.
pub(crate) fn with_snapshot_data(event: &Value, data: Value) -> Value {
    let mut replaced = event.clone();
    if let Some(properties) = replaced
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    {
        properties.insert(SNAPSHOT_DATA_KEY.to_owned(), data);
    }
    replaced
}

/// Serialized JSON byte length of a payload.
///
/// This is the packing budget probe: external policy code uses it to pick a
/// `max_size_bytes`, and the chunker uses it to decide split points.
pub fn byte_size<T: Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map_or(0, |bytes| bytes.len())
}
