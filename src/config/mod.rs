//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --nrfcfg path (or default location)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, version check)
//!     → NrfConfig (validated, immutable)
//!     → handed to the lifecycle controller at configure time
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config_path, ConfigError};
pub use schema::{Endpoint, LogSetting, LoggerConfig, NrfConfig, SbiConfig, Scheme, TelemetryConfig};
