//! CropMe Video Trimmer Library
//!
//! Mark an in-point and an out-point on a video and cut that range into a
//! sibling file with ffmpeg's lossless stream copy.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{DefaultAppContainer, ExportHandle, SessionSettings, TrimInteractor, TrimPorts};
pub use config_initialization::AppConfig;
pub use domain::errors::DomainError;
pub use domain::model::{DurationSemantics, ExportOutcome, ExportRequest, Preferences, SessionState};
pub use domain::session::TrimSession;
pub use error::{CropMeError, CropMeResult};
