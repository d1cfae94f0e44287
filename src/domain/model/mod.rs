// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;


/// Informal lifecycle of a trim session, used to gate which commands are available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing opened yet, or the source was deleted
    NoMedia,
    /// A source is loaded but the range is not complete
    MediaLoaded,
    /// Both in- and out-point are set
    RangeMarked,
    /// An export job is running
    Exporting,
    /// The last export finished successfully
    Exported,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::NoMedia => "no media",
            SessionState::MediaLoaded => "media loaded",
            SessionState::RangeMarked => "range marked",
            SessionState::Exporting => "exporting",
            SessionState::Exported => "exported",
        };
        f.write_str(name)
    }
}

/// How the out-point is turned into the encoder's duration argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationSemantics {
    /// Duration is `out - in`, so the clip ends at the out-point
    #[default]
    Span,
    /// Duration is the raw out-point, so the clip runs `out` past the in-point
    OutPoint,
}

impl DurationSemantics {
    /// Parse semantics from string
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "span" => Ok(DurationSemantics::Span),
            "out-point" | "outpoint" | "legacy" => Ok(DurationSemantics::OutPoint),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid duration semantics: {}. Valid values: span, out-point",
                value
            ))),
        }
    }

    /// Encoder duration in milliseconds for a marked range
    pub fn duration_ms(&self, in_point_ms: u64, out_point_ms: u64) -> u64 {
        match self {
            DurationSemantics::Span => out_point_ms.saturating_sub(in_point_ms),
            DurationSemantics::OutPoint => out_point_ms,
        }
    }
}

/// Step sizes used by the frame stepping commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub forward_ms: u64,
    pub back_ms: u64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            forward_ms: 500,
            back_ms: 500,
        }
    }
}

/// Everything the encoder needs to cut one clip
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_ms: u64,
    pub duration_ms: u64,
}

impl ExportRequest {
    pub fn start_seconds(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Start offset with the two-decimal precision handed to the encoder
    pub fn start_arg(&self) -> String {
        format!("{:.2}", self.start_seconds())
    }

    /// Duration with the two-decimal precision handed to the encoder
    pub fn duration_arg(&self) -> String {
        format!("{:.2}", self.duration_seconds())
    }
}

/// Snapshot of a running export
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportProgress {
    /// Media time written so far
    pub out_time_ms: u64,
    /// Expected clip length
    pub total_ms: u64,
    pub finished: bool,
}

impl ExportProgress {
    pub fn new(total_ms: u64) -> Self {
        Self {
            out_time_ms: 0,
            total_ms,
            finished: false,
        }
    }

    /// Progress percentage clamped to 0..=100
    pub fn percent(&self) -> f32 {
        if self.finished {
            return 100.0;
        }
        if self.total_ms == 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / self.total_ms as f64) * 100.0).min(100.0) as f32
    }
}

/// Result of a successful encoder run
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeReport {
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// How an export job ended
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Completed(EncodeReport),
    Cancelled,
    Failed(DomainError),
}

/// Values persisted across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Last browse location
    pub directory: PathBuf,
    /// Show the clip right after a successful export
    pub autoplay: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            directory: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            autoplay: false,
        }
    }
}

/// Transport state reported by the playback surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Notifications emitted by the playback surface
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    PositionChanged(i64),
    DurationChanged(u64),
    StatusChanged(PlaybackStatus),
    Error(String),
}
