//! Droplink bridge daemon library
//!
//! Everything the `droplinkd` binary wires together: configuration loading,
//! the CSV drop log, the REST query surface, and the WebSocket observer
//! surface. The telemetry semantics live in `droplink-core`; the device
//! link in `droplink-ble`.

pub mod cli;
pub mod config;
pub mod droplog;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

// Public API exports
pub use cli::Cli;
pub use config::{AppConfig, DropLogConfig, ServerConfig};
pub use droplog::CsvDropLog;
pub use error::ServerError;
pub use routes::build_router;
pub use state::AppState;
