// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for the surface that renders video and reports playback position
///
/// Position, duration and error notifications are delivered out of band as
/// [`PlaybackEvent`]s; the calls here are the commands the session issues.
#[async_trait]
pub trait PlaybackPort: Send + Sync {
    /// Load a media file, replacing whatever was loaded
    async fn load(&self, path: &Path) -> Result<(), DomainError>;

    /// Drop the current media
    async fn unload(&self);

    /// Start or resume playback
    async fn play(&self);

    /// Pause playback
    async fn pause(&self);

    /// Current transport state
    async fn status(&self) -> PlaybackStatus;

    /// Seek to an absolute position; range handling is up to the surface
    async fn seek(&self, position_ms: i64);

    /// Mute or unmute audio
    async fn set_muted(&self, muted: bool);
}

/// Port for reading media metadata
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Total media duration in milliseconds
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64, DomainError>;
}

/// Port for values persisted across runs
#[async_trait]
pub trait PreferencePort: Send + Sync {
    /// Read stored preferences, falling back to defaults
    async fn load(&self) -> Result<Preferences, DomainError>;

    /// Persist preferences
    async fn save(&self, preferences: &Preferences) -> Result<(), DomainError>;

    /// Where preferences are stored, if anywhere
    fn location(&self) -> Option<PathBuf>;
}

/// Port for the out-of-process encoder that cuts a clip
#[async_trait]
pub trait EncoderPort: Send + Sync {
    /// Run the encoder to completion
    ///
    /// Progress is published on `progress`. A message on `cancel` must stop
    /// the encoder and resolve to [`DomainError::Cancelled`]; a dropped
    /// sender is not a cancellation.
    async fn encode(
        &self,
        request: &ExportRequest,
        progress: watch::Sender<ExportProgress>,
        cancel: oneshot::Receiver<()>,
    ) -> Result<EncodeReport, DomainError>;
}

/// Port for showing a freshly exported clip
#[async_trait]
pub trait PreviewPort: Send + Sync {
    /// Display the clip; returns once the viewer has been launched
    async fn preview(&self, path: &Path) -> Result<(), DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if file exists
    fn file_exists(&self, path: &Path) -> bool;

    /// Delete file
    async fn delete_file(&self, path: &Path) -> Result<(), DomainError>;
}

/// Port for asking the user a yes/no question
#[async_trait]
pub trait ConfirmPort: Send + Sync {
    /// Ask `prompt`; anything but an explicit yes counts as no
    async fn confirm(&self, prompt: &str) -> bool;
}
