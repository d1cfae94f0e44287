//! Logging configuration and subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{CropMeError, CropMeResult};

/// Logging configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `cropme=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Pretty,
    /// Compact text format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(value: &str) -> CropMeResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(CropMeError::ConfigError {
                message: format!(
                    "Invalid log format: {}. Valid formats: pretty, compact, json",
                    other
                ),
            }),
        }
    }
}

impl LoggingConfig {
    /// Build the filter, letting `RUST_LOG` take precedence over the configured level
    pub fn env_filter(&self) -> CropMeResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| CropMeError::ConfigError {
            message: format!("Invalid log level '{}': {}", self.level, e),
        })
    }

    /// Install the global subscriber; a second call is a no-op
    pub fn init(&self) -> CropMeResult<()> {
        let filter = self.env_filter()?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        let result = match self.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };

        if let Err(e) = result {
            tracing::debug!("Logging already initialized: {}", e);
        }
        Ok(())
    }
}
