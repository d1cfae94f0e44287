//! CLI module for CropMe
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;
pub mod repl;

pub use args::{PrefsArgs, SessionArgs, TrimArgs};

/// CropMe video trimmer
///
/// Mark an in-point and an out-point on a video and cut that range into a
/// new file next to the source with a lossless stream copy.
#[derive(Parser, Debug)]
#[command(name = "cropme")]
#[command(about = "CropMe - Mark a range, cut a clip")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level or filter directive (e.g. debug, cropme=trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (default: <config dir>/cropme/config.toml)
    #[arg(long, global = true, env = "CROPME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Preference file (default: <config dir>/cropme/preferences.toml)
    #[arg(long, global = true, env = "CROPME_PREFS_FILE")]
    pub prefs_file: Option<PathBuf>,

    /// The command to execute; an interactive session when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive trimming session
    Session(SessionArgs),
    /// Cut one range without the interactive session
    Trim(TrimArgs),
    /// Show or change stored preferences
    Prefs(PrefsArgs),
}

impl Cli {
    /// Duration semantics requested on the command line, if any
    pub fn semantics_override(&self) -> Option<&str> {
        match &self.command {
            Some(Commands::Session(args)) => args.semantics.as_deref(),
            Some(Commands::Trim(args)) => args.semantics.as_deref(),
            _ => None,
        }
    }
}
