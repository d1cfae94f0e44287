// Trim interactor - Orchestrates the trim session against its collaborators

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::export_job::ExportHandle;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::OutputPathAllocator;
use crate::domain::session::TrimSession;
use crate::ports::*;
use crate::utils::path::{containing_directory, display_name};
use crate::utils::time::format_hhmmss_millis;


/// Collaborators the interactor drives
#[derive(Clone)]
pub struct TrimPorts {
    pub playback: Arc<dyn PlaybackPort>,
    pub preferences: Arc<dyn PreferencePort>,
    pub encoder: Arc<dyn EncoderPort>,
    pub previewer: Arc<dyn PreviewPort>,
    pub fs: Arc<dyn FsPort>,
    pub confirm: Arc<dyn ConfirmPort>,
}

/// Session tuning that comes from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSettings {
    pub steps: StepConfig,
    pub semantics: DurationSemantics,
}

/// Interactor for the trim workflow
///
/// Front ends call one method per user command and render `status()` as
/// inline text; every failure ends the command, never the session.
pub struct TrimInteractor {
    session: TrimSession,
    preferences: Preferences,
    playback_status: PlaybackStatus,
    status: Option<String>,
    ports: TrimPorts,
}

impl TrimInteractor {
    /// Create interactor, restoring persisted preferences
    pub async fn start(ports: TrimPorts, settings: SessionSettings) -> Self {
        if let Some(location) = ports.preferences.location() {
            debug!("Preferences stored at {}", location.display());
        }
        let preferences = match ports.preferences.load().await {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("Using default preferences: {}", e);
                Preferences::default()
            }
        };
        debug!(
            "Restored preferences: directory = {}, autoplay = {}",
            preferences.directory.display(),
            preferences.autoplay
        );

        Self {
            session: TrimSession::new(preferences.autoplay, settings.steps, settings.semantics),
            preferences,
            playback_status: PlaybackStatus::Stopped,
            status: None,
            ports,
        }
    }

    pub fn session(&self) -> &TrimSession {
        &self.session
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Directory a file dialog should start in
    pub fn browse_directory(&self) -> &Path {
        &self.preferences.directory
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.playback_status
    }

    /// Inline status text for the last command
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    fn fail<T>(&mut self, error: DomainError) -> Result<T, DomainError> {
        warn!("{}", error);
        self.set_status(error.to_string());
        Err(error)
    }

    /// Open a media file; `None` means the selection was cancelled
    pub async fn open(&mut self, path: Option<PathBuf>) -> Result<bool, DomainError> {
        let Some(path) = path else {
            debug!("Open cancelled");
            return Ok(false);
        };

        if !self.ports.fs.file_exists(&path) {
            return self.fail(DomainError::FileNotFound(path.display().to_string()));
        }
        if let Err(e) = self.session.open(path.clone()) {
            return self.fail(e);
        }
        info!("Opened {}", path.display());
        self.status = None;

        self.preferences.directory = containing_directory(&path);
        if let Err(e) = self.ports.preferences.save(&self.preferences).await {
            warn!("Could not remember directory: {}", e);
        }

        if let Err(e) = self.ports.playback.load(&path).await {
            self.session.on_media_error(&e.to_string());
            let message = self
                .session
                .media_error()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string());
            self.set_status(message);
            return Err(e);
        }

        self.ports.playback.set_muted(true).await;
        self.ports.playback.play().await;
        Ok(true)
    }

    /// Apply a notification from the playback surface
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::PositionChanged(position_ms) => {
                self.session.on_position_changed(position_ms)
            }
            PlaybackEvent::DurationChanged(duration_ms) => {
                self.session.on_duration_changed(duration_ms)
            }
            PlaybackEvent::StatusChanged(status) => self.playback_status = status,
            PlaybackEvent::Error(message) => {
                warn!("Playback error: {}", message);
                self.session.on_media_error(&message);
                self.status = self.session.media_error().map(str::to_string);
            }
        }
    }

    pub async fn seek(&mut self, target_ms: i64) -> Result<(), DomainError> {
        match self.session.seek_target(target_ms) {
            Ok(target) => {
                self.ports.playback.seek(target).await;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn step_forward(&mut self) -> Result<i64, DomainError> {
        match self.session.step_forward_target() {
            Ok(target) => {
                self.ports.playback.seek(target).await;
                Ok(target)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn step_back(&mut self) -> Result<i64, DomainError> {
        match self.session.step_back_target() {
            Ok(target) => {
                self.ports.playback.seek(target).await;
                Ok(target)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Play when paused, pause when playing
    pub async fn toggle_playback(&mut self) -> Result<PlaybackStatus, DomainError> {
        if let Err(e) = self.session.ensure_playback() {
            return self.fail(e);
        }

        let next = if self.ports.playback.status().await == PlaybackStatus::Playing {
            self.ports.playback.pause().await;
            PlaybackStatus::Paused
        } else {
            self.ports.playback.play().await;
            PlaybackStatus::Playing
        };
        self.playback_status = next;
        Ok(next)
    }

    pub fn mark_in(&mut self) -> Result<u64, DomainError> {
        match self.session.mark_in() {
            Ok(position) => {
                self.set_status(format!("In: {}", format_hhmmss_millis(position)));
                Ok(position)
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn mark_out(&mut self) -> Result<u64, DomainError> {
        match self.session.mark_out() {
            Ok(position) => {
                self.set_status(format!("Out: {}", format_hhmmss_millis(position)));
                Ok(position)
            }
            Err(e) => self.fail(e),
        }
    }

    /// First free `<n>_<name>` next to the source
    pub fn allocate_output(&self) -> Result<PathBuf, DomainError> {
        let source = self.session.export_source()?;
        let fs = &self.ports.fs;
        OutputPathAllocator::allocate(source, |candidate| fs.file_exists(candidate))
    }

    /// Validate the range, pick an output name and launch the encoder
    ///
    /// The session stays in the exporting state until the job's outcome is
    /// passed to [`TrimInteractor::finish_export`].
    pub fn start_export(&mut self) -> Result<ExportHandle, DomainError> {
        let request = match self
            .allocate_output()
            .and_then(|output| self.session.begin_export(output))
        {
            Ok(request) => request,
            Err(e) => return self.fail(e),
        };

        info!(
            "Exporting {} -> {} (start {}s, duration {}s)",
            request.source.display(),
            request.output.display(),
            request.start_arg(),
            request.duration_arg()
        );
        self.set_status(format!("Exporting {}...", display_name(&request.output)));
        Ok(ExportHandle::spawn(Arc::clone(&self.ports.encoder), request))
    }

    /// Apply the outcome of a job started with [`TrimInteractor::start_export`]
    pub async fn finish_export(
        &mut self,
        outcome: ExportOutcome,
    ) -> Result<Option<PathBuf>, DomainError> {
        match outcome {
            ExportOutcome::Completed(report) => {
                let output = report.output;
                let autoplay = self.session.complete_export(output.clone());
                info!(
                    "Exported {} in {:.1}s",
                    output.display(),
                    report.elapsed.as_secs_f64()
                );
                self.set_status(format!("Exported {}", display_name(&output)));

                if autoplay {
                    if let Err(e) = self.ports.previewer.preview(&output).await {
                        warn!("{}", e);
                        self.set_status(format!("Exported {} ({})", display_name(&output), e));
                    }
                }
                Ok(Some(output))
            }
            ExportOutcome::Cancelled => {
                self.session.abort_export();
                self.set_status("Export cancelled");
                Ok(None)
            }
            ExportOutcome::Failed(e) => {
                self.session.abort_export();
                self.fail(e)
            }
        }
    }

    /// Export and wait for the encoder
    pub async fn export(&mut self) -> Result<Option<PathBuf>, DomainError> {
        let mut job = self.start_export()?;
        let outcome = job.join().await;
        self.finish_export(outcome).await
    }

    /// Delete the loaded source after confirmation; returns whether it was removed
    pub async fn delete_source(&mut self) -> Result<bool, DomainError> {
        if self.session.is_exporting() {
            return self.fail(DomainError::ExportInProgress);
        }
        let Some(source) = self.session.source_path().map(Path::to_path_buf) else {
            return self.fail(DomainError::NoMedia);
        };

        if self.ports.playback.status().await == PlaybackStatus::Playing {
            self.ports.playback.pause().await;
            self.playback_status = PlaybackStatus::Paused;
        }

        let prompt = format!("Delete {}?", display_name(&source));
        if !self.ports.confirm.confirm(&prompt).await {
            debug!("Delete of {} declined", source.display());
            return Ok(false);
        }

        if let Err(e) = self.ports.fs.delete_file(&source).await {
            let error = if matches!(e, DomainError::DeleteFailed(_)) {
                e
            } else {
                DomainError::DeleteFailed(e.to_string())
            };
            return self.fail(error);
        }

        self.ports.playback.unload().await;
        self.playback_status = PlaybackStatus::Stopped;
        self.session.source_deleted();
        self.set_status(format!("Deleted {}", display_name(&source)));
        Ok(true)
    }

    /// Flip and persist the autoplay-after-export flag
    pub async fn toggle_autoplay(&mut self) -> Result<bool, DomainError> {
        let enabled = self.session.toggle_autoplay();
        self.preferences.autoplay = enabled;

        if let Err(e) = self.ports.preferences.save(&self.preferences).await {
            self.session.set_autoplay(!enabled);
            self.preferences.autoplay = !enabled;
            return self.fail(e);
        }

        self.set_status(format!("Autoplay {}", if enabled { "on" } else { "off" }));
        Ok(enabled)
    }

    /// Show the most recent export
    pub async fn preview_last_export(&mut self) -> Result<(), DomainError> {
        let Some(path) = self.session.last_exported_path().map(Path::to_path_buf) else {
            return self.fail(DomainError::NothingToPreview);
        };

        match self.ports.previewer.preview(&path).await {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }
}
