//! Error types for the bridge daemon

use std::path::PathBuf;

use thiserror::Error;

use droplink_core::SinkError;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while starting or configuring the daemon. Request-time
/// failures never surface here: the query surface degrades to empty bodies
/// and the observer surface drops the affected client.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("drop log error: {0}")]
    Sink(#[from] SinkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
