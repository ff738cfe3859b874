//! Logging setup
//!
//! TigerStyle: Explicit telemetry configuration, one subscriber per process.

use crate::error::{Error, Result};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter used when RUST_LOG is unset
    pub log_level: String,
    /// Whether to output events to stdout
    pub stdout_enabled: bool,
    /// Include span enter/exit timings
    pub span_events_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "smartcache".to_string(),
            log_level: "info".to_string(),
            stdout_enabled: true,
            span_events_enabled: false,
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration with the given service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Disable stdout output
    pub fn without_stdout(mut self) -> Self {
        self.stdout_enabled = false;
        self
    }

    /// Emit span close events with timings
    pub fn with_span_events(mut self) -> Self {
        self.span_events_enabled = true;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - `SMARTCACHE_SERVICE_NAME`: Service name (default: "smartcache")
    /// - `RUST_LOG`: Log level filter (default: "info")
    pub fn from_env() -> Self {
        let service_name = std::env::var("SMARTCACHE_SERVICE_NAME")
            .unwrap_or_else(|_| "smartcache".to_string());
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            service_name,
            log_level,
            ..Default::default()
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `config.log_level` when set.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.stdout_enabled {
        let span_events = if config.span_events_enabled {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        Some(tracing_subscriber::fmt::layer().with_span_events(span_events))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Internal {
            reason: format!("failed to initialize tracing subscriber: {}", e),
        })?;

    tracing::info!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}
