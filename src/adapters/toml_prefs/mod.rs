// TOML preference adapter - Persists user preferences across runs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::Preferences;
use crate::ports::*;

/// On-disk layout; missing keys fall back to defaults
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    cropme: StoredPreferences,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    directory: Option<PathBuf>,
    autoplay: Option<bool>,
}

/// TOML file preference adapter
pub struct TomlPreferenceAdapter {
    path: PathBuf,
}

impl TomlPreferenceAdapter {
    /// Create adapter backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Adapter at the platform default location
    pub fn at_default_location() -> Self {
        Self::new(Self::default_path())
    }

    /// `<config_dir>/cropme/preferences.toml`, or the working directory as a fallback
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("cropme").join("preferences.toml"))
            .unwrap_or_else(|| PathBuf::from("cropme_preferences.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deserialize preferences from TOML, filling gaps with defaults
    fn deserialize(content: &str) -> Result<Preferences, DomainError> {
        let parsed: PreferenceFile = toml::from_str(content)
            .map_err(|e| DomainError::Preferences(format!("Failed to parse preferences: {}", e)))?;

        let defaults = Preferences::default();
        Ok(Preferences {
            directory: parsed.cropme.directory.unwrap_or(defaults.directory),
            autoplay: parsed.cropme.autoplay.unwrap_or(defaults.autoplay),
        })
    }

    fn serialize(preferences: &Preferences) -> Result<String, DomainError> {
        let file = PreferenceFile {
            cropme: StoredPreferences {
                directory: Some(preferences.directory.clone()),
                autoplay: Some(preferences.autoplay),
            },
        };
        toml::to_string_pretty(&file)
            .map_err(|e| DomainError::Preferences(format!("Failed to serialize preferences: {}", e)))
    }
}

#[async_trait]
impl PreferencePort for TomlPreferenceAdapter {
    async fn load(&self) -> Result<Preferences, DomainError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", self.path.display());
                return Ok(Preferences::default());
            }
            Err(e) => {
                return Err(DomainError::Preferences(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match Self::deserialize(&content) {
            Ok(preferences) => Ok(preferences),
            Err(e) => {
                warn!("Ignoring unreadable preferences: {}", e);
                Ok(Preferences::default())
            }
        }
    }

    async fn save(&self, preferences: &Preferences) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::Preferences(format!("Failed to create preference directory: {}", e))
            })?;
        }

        let content = Self::serialize(preferences)?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            DomainError::Preferences(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        info!(
            "Saved preferences: directory = {}, autoplay = {}",
            preferences.directory.display(),
            preferences.autoplay
        );
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}
