//! # Logging Setup
//!
//! Installs the global `tracing` subscriber for hosts embedding the engine.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BOLT_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `BOLT_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |

use crate::errors::TelemetryError;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive (e.g. `info`, `bolt_vm=debug`).
    pub level: String,
    /// JSON formatted output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            level: env::var("BOLT_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            json: env::var("BOLT_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Install the global subscriber.
///
/// Fails if `config.level` is not a valid directive or a subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    if config.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    }

    tracing::info!("[bolt-vm] logging initialized (level={}, json={})", config.level, config.json);
    Ok(())
}
