//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and load the service configuration
//! - Initialize logging from the per-subsystem levels
//! - Hand the configuration to the controller
//! - Connect the telemetry store, tolerating its absence
//!
//! # Design Decisions
//! - Fail fast on configuration errors
//! - Telemetry store trouble is reported, never fatal

use std::sync::Arc;

use thiserror::Error;

use crate::cli::ConfigFlags;
use crate::config::{load_config, resolve_config_path, ConfigError, TelemetryConfig};
use crate::lifecycle::controller::LifecycleController;
use crate::lifecycle::state::LifecycleError;
use crate::observability::init_logging;
use crate::telemetry::{ListStore, RedisStore};

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl LifecycleController {
    /// Load configuration, set up logging, and move to Configured.
    pub fn initialize(&self, flags: &ConfigFlags) -> Result<(), InitError> {
        let path = resolve_config_path(flags.nrfcfg.as_deref());
        let config = load_config(&path)?;

        init_logging(config.logger.as_ref());
        tracing::info!(config = ?path, version = %config.info.version, "Configuration loaded");
        if let Some(common) = &flags.free5gccfg {
            tracing::debug!(config = ?common, "Common config path passed through");
        }

        self.configure(config)?;
        Ok(())
    }
}

/// Connect to the telemetry store if it is enabled.
pub async fn connect_store(config: &TelemetryConfig) -> Option<Arc<dyn ListStore>> {
    if !config.enabled {
        tracing::debug!("Startup latency telemetry disabled");
        return None;
    }

    match RedisStore::connect(&config.store_url).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            tracing::warn!(url = %config.store_url, error = %e, "Telemetry store unreachable, continuing without it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::state::LifecycleState;
    use crate::wiring::NrfWiring;
    use std::io::Write;

    #[test]
    fn test_initialize_configures_controller() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[info]\nversion = \"1.0.0\"\n[configuration.sbi]\nscheme = \"http\"\nport = 8123").unwrap();

        let controller = LifecycleController::new(Arc::new(NrfWiring::new()));
        let flags = ConfigFlags {
            free5gccfg: None,
            nrfcfg: Some(file.path().to_path_buf()),
        };
        controller.initialize(&flags).unwrap();

        assert_eq!(controller.state(), LifecycleState::Configured);
        assert_eq!(controller.config().unwrap().configuration.sbi.port, 8123);
    }

    #[test]
    fn test_initialize_fails_on_bad_config() {
        let controller = LifecycleController::new(Arc::new(NrfWiring::new()));
        let flags = ConfigFlags {
            free5gccfg: None,
            nrfcfg: Some("/nonexistent/nrfcfg.toml".into()),
        };
        assert!(matches!(controller.initialize(&flags), Err(InitError::Config(_))));
        assert_eq!(controller.state(), LifecycleState::Uninitialized);
    }

    #[tokio::test]
    async fn test_disabled_telemetry_has_no_store() {
        let config = TelemetryConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(connect_store(&config).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_store_url_is_tolerated() {
        let config = TelemetryConfig {
            store_url: "not-a-url".into(),
            ..Default::default()
        };
        assert!(connect_store(&config).await.is_none());
    }
}
