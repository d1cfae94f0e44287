//! FFprobe adapter for media file probing
//!
//! This module reads container duration through `ffprobe`'s JSON output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    binary: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Extract the duration in milliseconds from `-print_format json -show_format` output
    pub fn parse_duration_ms(json: &str) -> Result<u64, DomainError> {
        let parsed: ProbeOutput = serde_json::from_str(json)
            .map_err(|e| DomainError::MediaLoad(format!("unreadable probe output: {}", e)))?;

        let duration = parsed
            .format
            .and_then(|format| format.duration)
            .ok_or_else(|| DomainError::MediaLoad("media has no duration".to_string()))?;

        let seconds: f64 = duration
            .trim()
            .parse()
            .map_err(|_| DomainError::MediaLoad(format!("invalid duration '{}'", duration)))?;

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DomainError::MediaLoad(format!(
                "invalid duration '{}'",
                duration
            )));
        }

        Ok((seconds * 1000.0) as u64)
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64, DomainError> {
        debug!("Probing {}", path.display());

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                DomainError::MediaLoad(format!(
                    "could not start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::MediaLoad(stderr.trim().to_string()));
        }

        Self::parse_duration_ms(&String::from_utf8_lossy(&output.stdout))
    }
}
