//! Headless playback surface
//!
//! Stands in for a video widget when running without a GUI: the duration
//! comes from the probe port and the position from a clock that advances
//! while "playing". Notifications go out on an unbounded channel, the same
//! way a widget would raise position/duration signals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

#[derive(Debug, Default)]
struct ClockState {
    loaded: Option<PathBuf>,
    duration_ms: u64,
    base_ms: i64,
    playing_since: Option<Instant>,
    muted: bool,
}

impl ClockState {
    fn position_ms(&self, now: Instant) -> i64 {
        let elapsed = self
            .playing_since
            .map(|since| now.saturating_duration_since(since).as_millis() as i64)
            .unwrap_or(0);
        (self.base_ms + elapsed).min(self.duration_ms as i64)
    }

    fn clamp(&self, position_ms: i64) -> i64 {
        position_ms.clamp(0, self.duration_ms as i64)
    }
}

/// Probe-backed virtual playback surface
pub struct HeadlessPlaybackAdapter {
    probe: Arc<dyn ProbePort>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    state: Mutex<ClockState>,
}

impl HeadlessPlaybackAdapter {
    /// Create the surface together with the receiver for its notifications
    pub fn new(probe: Arc<dyn ProbePort>) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let adapter = Self {
            probe,
            events,
            state: Mutex::new(ClockState::default()),
        };
        (adapter, receiver)
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.events.send(event).is_err() {
            debug!("Playback event dropped: no listener");
        }
    }

    /// Publish the clock's current position, stopping at the end of the media
    pub async fn tick(&self) {
        let mut state = self.state.lock().await;
        if state.loaded.is_none() {
            return;
        }

        let position = state.position_ms(Instant::now());
        if state.playing_since.is_some() && position >= state.duration_ms as i64 {
            state.base_ms = position;
            state.playing_since = None;
            self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Stopped));
        }
        self.emit(PlaybackEvent::PositionChanged(position));
    }

    pub async fn is_muted(&self) -> bool {
        self.state.lock().await.muted
    }
}

#[async_trait]
impl PlaybackPort for HeadlessPlaybackAdapter {
    async fn load(&self, path: &Path) -> Result<(), DomainError> {
        let duration_ms = match self.probe.probe_duration_ms(path).await {
            Ok(duration_ms) => duration_ms,
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                let mut state = self.state.lock().await;
                let muted = state.muted;
                *state = ClockState {
                    muted,
                    ..ClockState::default()
                };
                self.emit(PlaybackEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        let muted = state.muted;
        *state = ClockState {
            loaded: Some(path.to_path_buf()),
            duration_ms,
            muted,
            ..ClockState::default()
        };
        self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Stopped));
        self.emit(PlaybackEvent::DurationChanged(duration_ms));
        self.emit(PlaybackEvent::PositionChanged(0));
        Ok(())
    }

    async fn unload(&self) {
        let mut state = self.state.lock().await;
        let muted = state.muted;
        *state = ClockState {
            muted,
            ..ClockState::default()
        };
        self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Stopped));
    }

    async fn play(&self) {
        let mut state = self.state.lock().await;
        if state.loaded.is_none() || state.playing_since.is_some() {
            return;
        }
        if state.base_ms >= state.duration_ms as i64 {
            state.base_ms = 0;
        }
        state.playing_since = Some(Instant::now());
        self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Playing));
    }

    async fn pause(&self) {
        let mut state = self.state.lock().await;
        if state.playing_since.is_none() {
            return;
        }
        state.base_ms = state.position_ms(Instant::now());
        state.playing_since = None;
        self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Paused));
        self.emit(PlaybackEvent::PositionChanged(state.base_ms));
    }

    async fn status(&self) -> PlaybackStatus {
        let state = self.state.lock().await;
        match (&state.loaded, state.playing_since) {
            (Some(_), Some(_)) => PlaybackStatus::Playing,
            (Some(_), None) if state.base_ms > 0 => PlaybackStatus::Paused,
            _ => PlaybackStatus::Stopped,
        }
    }

    async fn seek(&self, position_ms: i64) {
        let mut state = self.state.lock().await;
        if state.loaded.is_none() {
            return;
        }
        state.base_ms = state.clamp(position_ms);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        self.emit(PlaybackEvent::PositionChanged(state.base_ms));
    }

    async fn set_muted(&self, muted: bool) {
        self.state.lock().await.muted = muted;
    }
}
