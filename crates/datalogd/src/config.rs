//! Configuration for the datalogger service.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{DatalogError, DatalogResult};

/// Datalogger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatalogConfig {
    /// Serial device configuration.
    pub device: DeviceConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Ingestion loop configuration.
    pub ingest: IngestConfig,
}

impl DatalogConfig {
    /// Load configuration from `datalog.toml` and the environment.
    pub fn load() -> DatalogResult<Self> {
        Figment::new()
            .merge(Toml::file("datalog.toml"))
            .merge(Env::prefixed("DATALOG_").split("_"))
            .extract()
            .map_err(|e| DatalogError::Config(e.to_string()))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &str) -> DatalogResult<Self> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("DATALOG_").split("_"))
            .extract()
            .map_err(|e| DatalogError::Config(e.to_string()))
    }

    /// Validate the loaded configuration.
    ///
    /// The device address is the only required setting; everything else has
    /// a usable default.
    pub fn validate(&self) -> DatalogResult<()> {
        if self.device.address.is_empty() {
            return Err(DatalogError::Config(
                "device address is required (set [device] address or DATALOG_DEVICE_ADDRESS)"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

/// Serial device configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device address, e.g. `/dev/ttyUSB0`. Required.
    pub address: String,
    /// Baud rate of the device.
    pub baud_rate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            baud_rate: 9600,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file location.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.db"),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
        }
    }
}

/// Ingestion loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Cooldown between reconnect attempts, in milliseconds.
    pub retry_cooldown_ms: u64,
    /// Quiescence window after opening the device, in milliseconds.
    pub settle_delay_ms: u64,
}

impl IngestConfig {
    /// Cooldown between reconnect attempts.
    #[must_use]
    pub const fn retry_cooldown(&self) -> Duration {
        Duration::from_millis(self.retry_cooldown_ms)
    }

    /// Quiescence window after opening the device.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            retry_cooldown_ms: 500,
            settle_delay_ms: 100,
        }
    }
}
