//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Map per-subsystem severity strings to tracing filter directives
//! - Report invalid or missing level settings after the subscriber is up
//!
//! # Design Decisions
//! - Each subsystem logs under its own target; the config picks a level per target
//! - `RUST_LOG` overrides the config-derived filter
//! - Unknown or empty levels fall back to info, never fail startup

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogSetting, LoggerConfig};

/// Target for the NRF's own records (the crate name).
pub const NRF_TARGET: &str = "nrf";
/// Target for config path resolution.
pub const PATH_UTIL_TARGET: &str = "path_util";
/// Target for the SBI route groups.
pub const OPENAPI_TARGET: &str = "openapi";
/// Target for database context setup.
pub const MONGODB_TARGET: &str = "mongodb";

/// Parse a severity name. `panic` and `fatal` collapse onto `error`.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// How a single subsystem's level was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSource {
    Configured,
    Unset,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLevel {
    pub target: &'static str,
    pub level: Level,
    pub source: LevelSource,
}

/// Log filter derived from the `logger` config section.
#[derive(Debug, Clone, Default)]
pub struct LogPlan {
    /// `None` when the config has no `logger` section at all.
    pub targets: Option<Vec<TargetLevel>>,
    pub report_caller: bool,
}

impl LogPlan {
    pub fn from_config(logger: Option<&LoggerConfig>) -> Self {
        let Some(logger) = logger else {
            return Self::default();
        };

        let entries = [
            (NRF_TARGET, &logger.nrf),
            (PATH_UTIL_TARGET, &logger.path_util),
            (OPENAPI_TARGET, &logger.open_api),
            (MONGODB_TARGET, &logger.mongodb_library),
        ];

        let mut targets = Vec::new();
        let mut report_caller = false;
        for (target, setting) in entries {
            if let Some(setting) = setting {
                report_caller |= setting.report_caller;
                targets.push(resolve_target(target, setting));
            }
        }

        Self {
            targets: Some(targets),
            report_caller,
        }
    }

    /// Render the filter directives, e.g. `info,nrf=debug,openapi=warn`.
    pub fn directives(&self) -> String {
        let mut directives = vec!["info".to_string()];
        for target in self.targets.iter().flatten() {
            directives.push(format!(
                "{}={}",
                target.target,
                target.level.to_string().to_ascii_lowercase()
            ));
        }
        directives.join(",")
    }

    /// Emit the outcome of level resolution. Call after the subscriber is installed.
    pub fn report(&self) {
        let Some(targets) = &self.targets else {
            tracing::warn!("NRF config without log level setting");
            return;
        };

        for target in targets {
            match &target.source {
                LevelSource::Configured => {
                    tracing::info!(subsystem = target.target, level = %target.level, "Log level set")
                }
                LevelSource::Unset => {
                    tracing::info!(subsystem = target.target, "Log level not set, defaulting to info")
                }
                LevelSource::Invalid(raw) => tracing::warn!(
                    subsystem = target.target,
                    level = %raw,
                    "Log level is invalid, set to info"
                ),
            }
        }
    }
}

fn resolve_target(target: &'static str, setting: &LogSetting) -> TargetLevel {
    if setting.debug_level.is_empty() {
        return TargetLevel {
            target,
            level: Level::INFO,
            source: LevelSource::Unset,
        };
    }

    match parse_level(&setting.debug_level) {
        Some(level) => TargetLevel {
            target,
            level,
            source: LevelSource::Configured,
        },
        None => TargetLevel {
            target,
            level: Level::INFO,
            source: LevelSource::Invalid(setting.debug_level.clone()),
        },
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(logger: Option<&LoggerConfig>) -> LogPlan {
    let plan = LogPlan::from_config(logger);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(plan.directives()));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(plan.report_caller)
                .with_line_number(plan.report_caller),
        )
        .try_init()
        .is_ok();

    if installed {
        plan.report();
    }
    plan
}
