//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the NRF.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Config file version this build understands.
pub const EXPECTED_CONFIG_VERSION: &str = "1.0.0";

/// Root configuration for the NRF process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NrfConfig {
    /// Document metadata (version, description).
    pub info: InfoConfig,

    /// Service configuration (SBI, database, telemetry).
    pub configuration: ServiceConfig,

    /// Per-subsystem log levels. Absent means "not configured".
    pub logger: Option<LoggerConfig>,

    /// Metrics exporter settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InfoConfig {
    pub version: String,
    pub description: String,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            description: "NRF initial local configuration".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    pub sbi: SbiConfig,
    pub mongodb: MongoDbConfig,
    pub telemetry: TelemetryConfig,
}

/// Scheme the SBI listener speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[serde(alias = "plain")]
    Http,
    #[serde(alias = "tls")]
    Https,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Service-based interface listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SbiConfig {
    pub scheme: Scheme,

    /// Address the listener binds to.
    pub binding_ipv4: String,

    pub port: u16,

    pub tls: TlsConfig,
}

impl Default for SbiConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Https,
            binding_ipv4: "127.0.0.10".to_string(),
            port: 8000,
            tls: TlsConfig::default(),
        }
    }
}

/// Bind address and scheme, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub addr: SocketAddr,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.addr)
    }
}

impl SbiConfig {
    /// Derive the endpoint the listener binds to.
    pub fn endpoint(&self) -> Result<Endpoint, std::net::AddrParseError> {
        let ip: IpAddr = self.binding_ipv4.parse()?;
        Ok(Endpoint {
            scheme: self.scheme,
            addr: SocketAddr::new(ip, self.port),
        })
    }
}

/// TLS certificate and key locations (PEM).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    pub pem: PathBuf,
    pub key: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            pem: PathBuf::from("support/TLS/nrf.pem"),
            key: PathBuf::from("support/TLS/nrf.key"),
        }
    }
}

/// Backing document database. The connection itself lives outside this crate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MongoDbConfig {
    pub name: String,
    pub url: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            name: "free5gc".to_string(),
            url: "mongodb://localhost:27017".to_string(),
        }
    }
}

/// Startup-latency telemetry window settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,

    /// Connection URL of the external list store.
    pub store_url: String,

    /// List holding the latency samples.
    pub latency_key: String,

    /// Key holding the launch instant (unix microseconds) written by the launcher.
    pub reference_key: String,

    /// Window length that triggers compaction.
    pub capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_url: "redis://127.0.0.1:6379/0".to_string(),
            latency_key: "nrflatency".to_string(),
            reference_key: "golang".to_string(),
            capacity: 10,
        }
    }
}

/// Log level settings for each subsystem that logs under its own target.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggerConfig {
    pub nrf: Option<LogSetting>,
    pub path_util: Option<LogSetting>,
    pub open_api: Option<LogSetting>,
    pub mongodb_library: Option<LogSetting>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LogSetting {
    /// Severity name, e.g. "info" or "debug". Empty means unset.
    pub debug_level: String,

    /// Include source file and line in log records.
    pub report_caller: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Whether the Prometheus exporter is installed.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
