//! Session replay processing library.
//!
//! Pure, deterministic, in-memory transforms for browser session-replay
//! event streams:
//!
//! - **Capture side**: group `$snapshot` events by session and window,
//!   compress each group (gzip-base64, one item per record) and split
//!   over-budget groups into size-bounded chunks with sequencing metadata.
//! - **Playback side**: reassemble original payloads from an unordered,
//!   duplicated or partial chunk collection, with optional pagination and an
//!   activity-only projection.
//! - **Timeline side**: derive active/inactive segments from activity
//!   signals for scrubbing and analytics views.
//!
//! ```text
//! capture:  split -> compress -> chunk          (preprocess_replay_events)
//! playback: storage -> reassemble -> segment    (decompress_chunked_snapshot_data,
//!                                                get_active_segments_from_event_list)
//! ```
//!
//! Every entry point consumes its input and allocates fresh output; there is
//! no shared state, cache or internal concurrency, so callers may process
//! independent sessions in parallel without coordination.

pub mod chunk;
pub mod compress;
pub mod error;
pub mod reassembly;
pub mod segment;
pub mod snapshot;
pub mod summary;

pub use chunk::{chunk_replay_events_by_window, preprocess_replay_events, DEFAULT_MAX_SIZE_BYTES};
pub use compress::{compress_record, compress_replay_events, decompress_record};
pub use error::{DecodeError, Error, Result};
pub use reassembly::{
    decompress_chunked_snapshot_data, DecompressedRecording, ReassemblyOptions, TaggedSnapshot,
};
pub use segment::{
    generate_inactive_segments_for_range, get_active_segments_from_event_list, RecordingSegment,
};
pub use snapshot::{
    byte_size, is_snapshot_event, split_replay_events, ChunkedSnapshot, CompressedSnapshot,
    SnapshotRecord, GZIP_BASE64, SNAPSHOT_EVENT,
};
pub use summary::{events_summary_from_records, is_active_event, is_full_snapshot, EventSummary};
