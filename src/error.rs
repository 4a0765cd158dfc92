//! Error types for the replay processing pipeline.
//!
//! Two error surfaces exist on purpose:
//!
//! - [`Error`] covers capture-side failures: events with entirely wrong
//!   shapes, or serialization/compression machinery breaking. These are loud.
//! - [`DecodeError`] covers a single compressed blob failing to decode during
//!   reassembly. Callers skip the affected element and keep going; a corrupt
//!   blob never aborts a batch.

use thiserror::Error;

/// Errors raised by the capture-side pipeline (compression and chunking).
#[derive(Debug, Error)]
pub enum Error {
    /// A `$snapshot` event without a `$session_id` property.
    #[error("$snapshot event is missing the $session_id property")]
    MissingSessionId,

    /// A `$snapshot` event without a `$snapshot_data` property.
    #[error("$snapshot event is missing the $snapshot_data property")]
    MissingSnapshotData,

    /// A snapshot record could not be serialized.
    #[error("failed to serialize snapshot record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The gzip encoder failed mid-stream.
    #[error("gzip compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

/// Failure to decode one compressed item back into a snapshot record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 in compressed item: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid gzip stream in compressed item: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("decompressed item is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for capture-side results.
pub type Result<T> = std::result::Result<T, Error>;
