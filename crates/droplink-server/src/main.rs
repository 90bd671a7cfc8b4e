//! Droplink bridge daemon entry point

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use droplink_ble::{BleTransport, LinkManager};
use droplink_core::{EventBus, TelemetryStore};
use droplink_server::{build_router, AppConfig, AppState, Cli, CsvDropLog, ServerError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_configuration(&cli)?;

    let bus = EventBus::default();
    let store = Arc::new(TelemetryStore::new(bus.clone()));
    let drop_log = Arc::new(CsvDropLog::new(&config.drop_log.path)?);
    info!(path = %drop_log.path().display(), "Drop log ready");

    // The device link runs for the life of the process, reconnecting
    // forever; there is no shutdown path beyond process termination.
    let transport = Arc::new(BleTransport::new(config.device.clone()));
    let mut link = LinkManager::new(
        config.device.clone(),
        transport,
        store.clone(),
        drop_log.clone(),
    );
    tokio::spawn(async move { link.run().await });
    info!(address = %config.device.address, "Device link running in background");

    let app = build_router(AppState {
        store,
        bus,
        drop_log,
    });
    let bind_addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "REST + WebSocket server started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_configuration(cli: &Cli) -> Result<AppConfig, ServerError> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            AppConfig::load_from_file(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(address) = &cli.address {
        config.device.address = address.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}
