// Trim session - The single stateful entity behind the trim workflow

use std::path::{Path, PathBuf};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::ExportPlanner;
use crate::utils::time::{format_hhmmss, format_hhmmss_millis};


/// State of one trimming session
///
/// The session never talks to the outside world. The interactor forwards
/// playback notifications into it and asks it for seek targets and export
/// requests, so every transition here is synchronous and testable.
#[derive(Debug, Clone)]
pub struct TrimSession {
    source_path: Option<PathBuf>,
    current_position_ms: i64,
    duration_ms: u64,
    in_point_ms: Option<u64>,
    out_point_ms: Option<u64>,
    autoplay_after_export: bool,
    last_exported_path: Option<PathBuf>,
    state: SessionState,
    playback_enabled: bool,
    media_error: Option<String>,
    steps: StepConfig,
    semantics: DurationSemantics,
    position_label: String,
    duration_label: String,
}

impl TrimSession {
    /// Create an empty session
    pub fn new(autoplay_after_export: bool, steps: StepConfig, semantics: DurationSemantics) -> Self {
        Self {
            source_path: None,
            current_position_ms: 0,
            duration_ms: 0,
            in_point_ms: None,
            out_point_ms: None,
            autoplay_after_export,
            last_exported_path: None,
            state: SessionState::NoMedia,
            playback_enabled: false,
            media_error: None,
            steps,
            semantics,
            position_label: String::new(),
            duration_label: String::new(),
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn current_position_ms(&self) -> i64 {
        self.current_position_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn in_point_ms(&self) -> Option<u64> {
        self.in_point_ms
    }

    pub fn out_point_ms(&self) -> Option<u64> {
        self.out_point_ms
    }

    pub fn autoplay_after_export(&self) -> bool {
        self.autoplay_after_export
    }

    pub fn last_exported_path(&self) -> Option<&Path> {
        self.last_exported_path.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn playback_enabled(&self) -> bool {
        self.playback_enabled
    }

    pub fn media_error(&self) -> Option<&str> {
        self.media_error.as_deref()
    }

    pub fn steps(&self) -> StepConfig {
        self.steps
    }

    pub fn semantics(&self) -> DurationSemantics {
        self.semantics
    }

    /// Human-readable current playback position
    pub fn position_label(&self) -> &str {
        &self.position_label
    }

    /// Human-readable total duration
    pub fn duration_label(&self) -> &str {
        &self.duration_label
    }

    pub fn is_exporting(&self) -> bool {
        self.state == SessionState::Exporting
    }

    /// Export is available once both points are set and nothing is running
    pub fn can_export(&self) -> bool {
        self.source_path.is_some()
            && self.in_point_ms.is_some()
            && self.out_point_ms.is_some()
            && !self.is_exporting()
    }

    /// Replace the source and forget everything tied to the previous one
    pub fn open(&mut self, path: PathBuf) -> Result<(), DomainError> {
        if self.is_exporting() {
            return Err(DomainError::ExportInProgress);
        }

        self.source_path = Some(path);
        self.current_position_ms = 0;
        self.duration_ms = 0;
        self.in_point_ms = None;
        self.out_point_ms = None;
        self.last_exported_path = None;
        self.playback_enabled = true;
        self.media_error = None;
        self.position_label = format_hhmmss_millis(0);
        self.duration_label = String::new();
        self.refresh_state();
        Ok(())
    }

    pub fn on_position_changed(&mut self, position_ms: i64) {
        self.current_position_ms = position_ms;
        if position_ms >= 0 {
            self.position_label = format_hhmmss_millis(position_ms as u64);
        }
    }

    /// New duration also seeds the out-point to the end of the file
    pub fn on_duration_changed(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.duration_label = format_hhmmss(duration_ms);
        if self.source_path.is_some() && !self.is_exporting() {
            self.out_point_ms = Some(duration_ms);
            self.refresh_state();
        }
    }

    /// Record a playback failure; controls stay disabled until the next open
    pub fn on_media_error(&mut self, message: &str) {
        self.playback_enabled = false;
        self.media_error = Some(format!("Error: {}", message));
    }

    pub fn mark_in(&mut self) -> Result<u64, DomainError> {
        let position = self.markable_position()?;
        self.in_point_ms = Some(position);
        self.refresh_state();
        Ok(position)
    }

    pub fn mark_out(&mut self) -> Result<u64, DomainError> {
        let position = self.markable_position()?;
        self.out_point_ms = Some(position);
        self.refresh_state();
        Ok(position)
    }

    /// Validate a seek request; the target itself is not range checked
    pub fn seek_target(&self, target_ms: i64) -> Result<i64, DomainError> {
        self.ensure_playback()?;
        Ok(target_ms)
    }

    pub fn step_forward_target(&self) -> Result<i64, DomainError> {
        self.ensure_playback()?;
        Ok(self
            .current_position_ms
            .saturating_add(self.steps.forward_ms as i64))
    }

    pub fn step_back_target(&self) -> Result<i64, DomainError> {
        self.ensure_playback()?;
        Ok(self
            .current_position_ms
            .saturating_sub(self.steps.back_ms as i64))
    }

    /// Check export preconditions and hand back the source to name the output after
    pub fn export_source(&self) -> Result<&Path, DomainError> {
        if self.is_exporting() {
            return Err(DomainError::ExportInProgress);
        }
        let source = self.source_path.as_deref().ok_or(DomainError::NoMedia)?;
        ExportPlanner::validate_range(self.in_point_ms, self.out_point_ms)?;
        Ok(source)
    }

    /// Build the encoder request and enter the exporting state
    pub fn begin_export(&mut self, output: PathBuf) -> Result<ExportRequest, DomainError> {
        let source = self.export_source()?.to_path_buf();
        let request = ExportPlanner::plan(
            &source,
            output,
            self.in_point_ms,
            self.out_point_ms,
            self.semantics,
        )?;
        self.state = SessionState::Exporting;
        Ok(request)
    }

    /// Record a finished export; returns whether the clip should be previewed
    pub fn complete_export(&mut self, output: PathBuf) -> bool {
        self.last_exported_path = Some(output);
        self.state = SessionState::Exported;
        self.autoplay_after_export
    }

    /// Leave the exporting state without recording an export
    pub fn abort_export(&mut self) {
        if self.is_exporting() {
            self.state = SessionState::MediaLoaded;
            self.refresh_state();
        }
    }

    /// The source file is gone; keep only what outlives it
    pub fn source_deleted(&mut self) {
        self.source_path = None;
        self.current_position_ms = 0;
        self.duration_ms = 0;
        self.in_point_ms = None;
        self.out_point_ms = None;
        self.playback_enabled = false;
        self.media_error = None;
        self.position_label.clear();
        self.duration_label.clear();
        self.refresh_state();
    }

    pub fn toggle_autoplay(&mut self) -> bool {
        self.autoplay_after_export = !self.autoplay_after_export;
        self.autoplay_after_export
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay_after_export = enabled;
    }

    /// Playback controls need a source and no outstanding media error
    pub fn ensure_playback(&self) -> Result<(), DomainError> {
        if self.source_path.is_none() {
            return Err(DomainError::NoMedia);
        }
        if !self.playback_enabled {
            return Err(DomainError::PlaybackUnavailable(
                self.media_error
                    .clone()
                    .unwrap_or_else(|| "playback disabled".to_string()),
            ));
        }
        Ok(())
    }

    fn markable_position(&self) -> Result<u64, DomainError> {
        if self.source_path.is_none() {
            return Err(DomainError::NoMedia);
        }
        u64::try_from(self.current_position_ms).map_err(|_| {
            DomainError::InvalidTimeRange(format!(
                "cannot mark negative position {} ms",
                self.current_position_ms
            ))
        })
    }

    fn refresh_state(&mut self) {
        if self.is_exporting() {
            return;
        }
        self.state = match (&self.source_path, self.in_point_ms, self.out_point_ms) {
            (None, _, _) => SessionState::NoMedia,
            (Some(_), Some(_), Some(_)) => SessionState::RangeMarked,
            (Some(_), _, _) => SessionState::MediaLoaded,
        };
    }
}
