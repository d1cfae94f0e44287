//! CropMe Video Trimmer
//!
//! Mark an in-point and an out-point on a video, then cut that range into a
//! new file next to the source with a lossless stream copy.
//!
//! # Usage
//!
//! ```bash
//! cropme                                   # interactive session
//! cropme session video.mp4                 # interactive session, video opened
//! cropme trim --input video.mp4 --start 0:12 --end 0:47.5
//! cropme prefs --toggle-autoplay
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cropme::cli::{commands, Cli, Commands, SessionArgs};
use cropme::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the CropMe application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let (config, summary) =
        initialize_configuration_hierarchy(&cli).context("Failed to load configuration")?;
    config.logging.init()?;

    info!("Starting CropMe");
    summary.log();

    let prefs_file = cli.prefs_file.clone();
    match cli.command {
        None => commands::session(&config, prefs_file, SessionArgs::default()).await?,
        Some(Commands::Session(args)) => commands::session(&config, prefs_file, args).await?,
        Some(Commands::Trim(args)) => commands::trim(&config, prefs_file, args).await?,
        Some(Commands::Prefs(args)) => commands::prefs(prefs_file, args).await?,
    }

    info!("CropMe completed successfully");
    Ok(())
}
