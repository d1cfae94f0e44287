//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the interactive session
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Video to open on start
    pub input: Option<PathBuf>,

    /// How the encoder duration is derived: span (out - in) or out-point
    #[arg(long)]
    pub semantics: Option<String>,
}

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// In-point (H:MM:SS.ms, M:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// Out-point (H:MM:SS.ms, M:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// How the encoder duration is derived: span (out - in) or out-point
    #[arg(long)]
    pub semantics: Option<String>,

    /// Open the clip in the previewer once it is written
    #[arg(long)]
    pub preview: bool,
}

/// Arguments for the prefs command
#[derive(Args, Debug)]
pub struct PrefsArgs {
    /// Flip the autoplay-after-export preference
    #[arg(long)]
    pub toggle_autoplay: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
