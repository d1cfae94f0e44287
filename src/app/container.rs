use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::adapters::confirm_line::SharedLines;
use crate::adapters::{
    FfmpegEncoderAdapter, FfplayPreviewAdapter, FfprobeAdapter, HeadlessPlaybackAdapter,
    LineConfirmAdapter, LocalFsAdapter, TomlPreferenceAdapter,
};
use crate::app::trim_interactor::{SessionSettings, TrimInteractor, TrimPorts};
use crate::config_initialization::AppConfig;
use crate::domain::model::PlaybackEvent;
use crate::error::CropMeResult;
use crate::ports::{ConfirmPort, EncoderPort, FsPort, PlaybackPort, PreferencePort, PreviewPort, ProbePort};
use crate::utils::path::resolve_binary;

/// Wires the production adapters into a trim interactor
pub struct DefaultAppContainer {
    ports: TrimPorts,
    settings: SessionSettings,
    playback: Arc<HeadlessPlaybackAdapter>,
    events: Option<mpsc::UnboundedReceiver<PlaybackEvent>>,
    lines: SharedLines<BufReader<Stdin>>,
}

impl DefaultAppContainer {
    /// Resolve the media tools and build every adapter
    ///
    /// Fails when ffmpeg or ffprobe cannot be found; a missing previewer only
    /// surfaces when a preview is attempted.
    pub fn new(config: &AppConfig, prefs_file: Option<PathBuf>) -> CropMeResult<Self> {
        let ffmpeg = resolve_binary(&config.encoder.ffmpeg_path)?;
        let ffprobe = resolve_binary(&config.encoder.ffprobe_path)?;
        debug!("Using {} and {}", ffmpeg.display(), ffprobe.display());

        let viewer = resolve_binary(&config.preview.command).unwrap_or_else(|e| {
            warn!("{}; preview will be unavailable", e);
            config.preview.command.clone()
        });

        let probe_port = Arc::new(FfprobeAdapter::new(ffprobe));
        let (playback, events) =
            HeadlessPlaybackAdapter::new(Arc::clone(&probe_port) as Arc<dyn ProbePort>);
        let playback = Arc::new(playback);

        let preference_port = Arc::new(match prefs_file {
            Some(path) => TomlPreferenceAdapter::new(path),
            None => TomlPreferenceAdapter::at_default_location(),
        });

        let lines: SharedLines<BufReader<Stdin>> =
            Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

        let ports = TrimPorts {
            playback: Arc::clone(&playback) as Arc<dyn PlaybackPort>,
            preferences: preference_port as Arc<dyn PreferencePort>,
            encoder: Arc::new(FfmpegEncoderAdapter::new(ffmpeg)) as Arc<dyn EncoderPort>,
            previewer: Arc::new(FfplayPreviewAdapter::new(viewer, config.preview.args.clone()))
                as Arc<dyn PreviewPort>,
            fs: Arc::new(LocalFsAdapter::new()) as Arc<dyn FsPort>,
            confirm: Arc::new(LineConfirmAdapter::new(Arc::clone(&lines))) as Arc<dyn ConfirmPort>,
        };

        Ok(Self {
            ports,
            settings: config.session_settings(),
            playback,
            events: Some(events),
            lines,
        })
    }

    /// Fresh interactor with preferences restored from disk
    pub async fn trim_interactor(&self) -> TrimInteractor {
        TrimInteractor::start(self.ports.clone(), self.settings).await
    }

    /// Headless surface, for driving its clock
    pub fn playback(&self) -> Arc<HeadlessPlaybackAdapter> {
        Arc::clone(&self.playback)
    }

    /// Playback notifications; only the first caller gets the receiver
    pub fn take_playback_events(&mut self) -> Option<mpsc::UnboundedReceiver<PlaybackEvent>> {
        self.events.take()
    }

    /// Stdin lines shared with the confirmation prompt
    pub fn lines(&self) -> SharedLines<BufReader<Stdin>> {
        Arc::clone(&self.lines)
    }
}
