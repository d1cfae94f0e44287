// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// No media is loaded into the session
    #[error("No media loaded")]
    NoMedia,
    /// Playback surface failed to load or play the media
    #[error("Media error: {0}")]
    MediaLoad(String),
    /// Playback controls are disabled after a media error
    #[error("Playback unavailable: {0}")]
    PlaybackUnavailable(String),
    /// In- or out-point missing
    #[error("Range incomplete: {0}")]
    RangeIncomplete(String),
    /// Invalid time range
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),
    /// Another export is still running for this session
    #[error("An export is already in progress")]
    ExportInProgress,
    /// Encoder could not be started or exited unsuccessfully
    #[error("Export failed: {0}")]
    ExportFailed(String),
    /// Export was cancelled before completion
    #[error("Export cancelled")]
    Cancelled,
    /// No free output name could be found
    #[error("Output path exhausted: {0}")]
    OutputPathExhausted(String),
    /// Removing the source file failed
    #[error("Delete failed: {0}")]
    DeleteFailed(String),
    /// Nothing has been exported yet
    #[error("Nothing to preview: no export has completed")]
    NothingToPreview,
    /// Previewer could not be launched
    #[error("Preview failed: {0}")]
    PreviewFailed(String),
    /// Preference store read/write failure
    #[error("Preference store error: {0}")]
    Preferences(String),
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Whether the error represents a user decision rather than a fault
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
