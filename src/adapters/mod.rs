// Adapters - External system implementations

pub mod confirm_line;
pub mod exec_ffmpeg;
pub mod fs_local;
pub mod playback_headless;
pub mod preview_ffplay;
pub mod probe_ffprobe;
pub mod toml_prefs;

// Re-export adapters
pub use confirm_line::LineConfirmAdapter;
pub use exec_ffmpeg::FfmpegEncoderAdapter;
pub use fs_local::LocalFsAdapter;
pub use playback_headless::HeadlessPlaybackAdapter;
pub use preview_ffplay::FfplayPreviewAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use toml_prefs::TomlPreferenceAdapter;
