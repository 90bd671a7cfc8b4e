//! Daemon configuration
//!
//! Loaded from an optional TOML file with CLI overrides applied on top;
//! every field has a default so a bare `droplinkd` works out of the box.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use droplink_ble::LinkConfig;

use crate::error::ServerError;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the bridge daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Device link configuration.
    pub device: LinkConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Drop log configuration.
    pub drop_log: DropLogConfig,
}

/// HTTP listen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Location of the durable drop log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DropLogConfig {
    pub path: PathBuf,
}

impl Default for DropLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("drop_log.csv"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ServerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ServerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
