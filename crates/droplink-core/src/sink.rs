//! Durable drop-sink seam
//!
//! The core hands every decoded drop event to a [`DropSink`] and forgets it:
//! the record is never re-queued or read back here. The CSV-backed
//! implementation lives in `droplink-server`; tests substitute an in-memory
//! sink.

use thiserror::Error;

use crate::types::DropRecord;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors from the durable sink. A failed append is logged by the caller and
/// the record dropped; it never propagates into the link loop.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Record(String),
}

// ----------------------------------------------------------------------------
// Sink Trait
// ----------------------------------------------------------------------------

/// Append-only destination for drop records.
///
/// Each successful call must result in one durably persisted row; the
/// implementation is responsible for initializing its schema when no prior
/// record exists.
pub trait DropSink: Send + Sync {
    fn append(&self, record: &DropRecord) -> Result<(), SinkError>;
}
