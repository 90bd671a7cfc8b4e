//! Command-line interface for the bridge daemon

use std::path::PathBuf;

use clap::Parser;

/// Droplink bridge daemon: ingests sensor telemetry over BLE and fans it
/// out to REST and WebSocket observers.
#[derive(Debug, Parser)]
#[command(name = "droplinkd", version)]
pub struct Cli {
    /// Path to a droplink.toml configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the device Bluetooth address
    #[arg(long)]
    pub address: Option<String>,

    /// Override the HTTP listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,
}
