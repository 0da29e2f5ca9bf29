//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the config document version
//! - Validate value ranges (port non-zero, capacity >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NrfConfig → Result<(), Vec<ValidationError>>

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::{NrfConfig, Scheme, EXPECTED_CONFIG_VERSION};

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("config version is [{found}], but expected is [{expected}]")]
    VersionMismatch { found: String, expected: &'static str },

    #[error("sbi.binding_ipv4 [{0}] is not an IP address")]
    InvalidBindingAddress(String),

    #[error("sbi.port must be non-zero")]
    ZeroPort,

    #[error("sbi.tls.{0} must be set when scheme is https")]
    MissingTlsPath(&'static str),

    #[error("telemetry.capacity must be at least 1")]
    ZeroCapacity,

    #[error("telemetry.{0} must not be empty")]
    EmptyTelemetryKey(&'static str),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &NrfConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.info.version != EXPECTED_CONFIG_VERSION {
        errors.push(ValidationError::VersionMismatch {
            found: config.info.version.clone(),
            expected: EXPECTED_CONFIG_VERSION,
        });
    }

    let sbi = &config.configuration.sbi;
    if sbi.binding_ipv4.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindingAddress(sbi.binding_ipv4.clone()));
    }
    if sbi.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if sbi.scheme == Scheme::Https {
        if sbi.tls.pem.as_os_str().is_empty() {
            errors.push(ValidationError::MissingTlsPath("pem"));
        }
        if sbi.tls.key.as_os_str().is_empty() {
            errors.push(ValidationError::MissingTlsPath("key"));
        }
    }

    let telemetry = &config.configuration.telemetry;
    if telemetry.enabled {
        if telemetry.capacity == 0 {
            errors.push(ValidationError::ZeroCapacity);
        }
        if telemetry.latency_key.is_empty() {
            errors.push(ValidationError::EmptyTelemetryKey("latency_key"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
