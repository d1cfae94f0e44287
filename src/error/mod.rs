//! Error handling module for CropMe

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for CropMe operations
#[derive(Error, Debug)]
pub enum CropMeError {
    /// Invalid time format
    #[error("Invalid time format: {time}. Expected H:MM:SS.ms, M:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// Configuration file or value error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// External binary could not be located
    #[error("Executable not found: {name}")]
    BinaryNotFound { name: String },

    /// Trim workflow error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

/// Result type alias for CropMe operations
pub type CropMeResult<T> = std::result::Result<T, CropMeError>;
