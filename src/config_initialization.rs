//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::trim_interactor::SessionSettings;
use crate::cli::Cli;
use crate::domain::model::{DurationSemantics, StepConfig};
use crate::error::{CropMeError, CropMeResult};
use crate::utils::logging::{LogFormat, LoggingConfig};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub encoder: EncoderConfig,
    pub preview: PreviewConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// External media tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Name on `PATH` or explicit path of ffmpeg
    pub ffmpeg_path: PathBuf,
    /// Name on `PATH` or explicit path of ffprobe
    pub ffprobe_path: PathBuf,
}

/// Viewer used for autoplay and preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub command: PathBuf,
    /// Arguments placed before the clip path
    pub args: Vec<String>,
}

/// Trimming behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub step_forward_ms: u64,
    pub step_back_ms: u64,
    pub duration_semantics: DurationSemantics,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("ffplay"),
            args: vec!["-autoexit".to_string()],
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let steps = StepConfig::default();
        Self {
            step_forward_ms: steps.forward_ms,
            step_back_ms: steps.back_ms,
            duration_semantics: DurationSemantics::default(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/cropme/config.toml`, or the working directory as a fallback
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("cropme").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("cropme.toml"))
    }

    /// Parse configuration from TOML; missing keys take defaults
    pub fn from_toml_str(content: &str) -> CropMeResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> CropMeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CropMeError::ConfigError {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `CROPME_*` overrides from `lookup`; returns the settings applied
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> CropMeResult<Vec<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();
        let mut hit = |key: &str| {
            let value = lookup(key);
            if let Some(value) = &value {
                applied.push(format!("environment {} = {}", key, value));
            }
            value
        };

        if let Some(value) = hit("CROPME_FFMPEG") {
            self.encoder.ffmpeg_path = PathBuf::from(value);
        }
        if let Some(value) = hit("CROPME_FFPROBE") {
            self.encoder.ffprobe_path = PathBuf::from(value);
        }
        if let Some(value) = hit("CROPME_PREVIEW_COMMAND") {
            self.preview.command = PathBuf::from(value);
        }
        if let Some(value) = hit("CROPME_STEP_FORWARD_MS") {
            self.session.step_forward_ms = parse_millis_setting("CROPME_STEP_FORWARD_MS", &value)?;
        }
        if let Some(value) = hit("CROPME_STEP_BACK_MS") {
            self.session.step_back_ms = parse_millis_setting("CROPME_STEP_BACK_MS", &value)?;
        }
        if let Some(value) = hit("CROPME_DURATION_SEMANTICS") {
            self.session.duration_semantics = DurationSemantics::parse(&value)?;
        }
        if let Some(value) = hit("CROPME_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = hit("CROPME_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&value)?;
        }

        self.validate()?;
        Ok(applied)
    }

    /// Apply command-line overrides; returns the settings applied
    pub fn apply_cli_overrides(&mut self, cli: &Cli) -> CropMeResult<Vec<String>> {
        let mut applied = Vec::new();

        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
            applied.push(format!("command line log_level = {}", level));
        }
        if let Some(semantics) = cli.semantics_override() {
            self.session.duration_semantics = DurationSemantics::parse(semantics)?;
            applied.push(format!("command line duration_semantics = {}", semantics));
        }

        Ok(applied)
    }

    pub fn steps(&self) -> StepConfig {
        StepConfig {
            forward_ms: self.session.step_forward_ms,
            back_ms: self.session.step_back_ms,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            steps: self.steps(),
            semantics: self.session.duration_semantics,
        }
    }

    fn validate(&self) -> CropMeResult<()> {
        if self.session.step_forward_ms == 0 || self.session.step_back_ms == 0 {
            return Err(CropMeError::ConfigError {
                message: "Step sizes must be greater than zero".to_string(),
            });
        }
        if self.encoder.ffmpeg_path.as_os_str().is_empty()
            || self.encoder.ffprobe_path.as_os_str().is_empty()
        {
            return Err(CropMeError::ConfigError {
                message: "Encoder paths cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_millis_setting(key: &str, value: &str) -> CropMeResult<u64> {
    value.trim().parse().map_err(|_| CropMeError::ConfigError {
        message: format!("{} must be a whole number of milliseconds, got '{}'", key, value),
    })
}

/// Where the configuration came from
///
/// Built before logging is set up, so it is reported afterwards via [`ConfigSummary::log`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSummary {
    pub file: Option<PathBuf>,
    pub overrides: Vec<String>,
}

impl ConfigSummary {
    pub fn log(&self) {
        match &self.file {
            Some(path) => info!("Configuration file: {}", path.display()),
            None => debug!("No configuration file, using defaults"),
        }
        for setting in &self.overrides {
            debug!("Override: {}", setting);
        }
        info!("Configuration loaded ({} overrides)", self.overrides.len());
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
///
/// An explicit `--config` file must exist; the default location is optional.
pub fn initialize_configuration_hierarchy(cli: &Cli) -> CropMeResult<(AppConfig, ConfigSummary)> {
    let file = match &cli.config {
        Some(path) => Some(path.clone()),
        None => Some(AppConfig::default_path()).filter(|path| path.is_file()),
    };
    let mut config = match &file {
        Some(path) => AppConfig::load_file(path)?,
        None => AppConfig::default(),
    };

    let mut overrides = config.apply_env_overrides(|key| std::env::var(key).ok())?;
    overrides.extend(config.apply_cli_overrides(cli)?);

    Ok((config, ConfigSummary { file, overrides }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.encoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.preview.args, vec!["-autoexit".to_string()]);
        assert_eq!(config.steps(), StepConfig::default());
        assert_eq!(config.session.duration_semantics, DurationSemantics::Span);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [session]
            step_back_ms = 1000
            duration_semantics = "out-point"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.step_forward_ms, 500);
        assert_eq!(config.session.step_back_ms, 1000);
        assert_eq!(config.session.duration_semantics, DurationSemantics::OutPoint);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.encoder, EncoderConfig::default());
    }

    #[test]
    fn test_zero_step_rejected() {
        let result = AppConfig::from_toml_str("[session]\nstep_forward_ms = 0\n");
        assert!(matches!(result, Err(CropMeError::ConfigError { .. })));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let result = AppConfig::from_toml_str("[session\nstep_forward_ms = ");
        assert!(matches!(result, Err(CropMeError::TomlDeError(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[encoder]\nffmpeg_path = \"/opt/ffmpeg/bin/ffmpeg\"").unwrap();

        let config = AppConfig::load_file(file.path()).unwrap();
        assert_eq!(
            config.encoder.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        let applied = config
            .apply_env_overrides(env(&[
                ("CROPME_STEP_FORWARD_MS", "250"),
                ("CROPME_DURATION_SEMANTICS", "legacy"),
                ("CROPME_LOG_LEVEL", "debug"),
                ("UNRELATED", "x"),
            ]))
            .unwrap();

        assert_eq!(
            applied,
            vec![
                "environment CROPME_STEP_FORWARD_MS = 250",
                "environment CROPME_DURATION_SEMANTICS = legacy",
                "environment CROPME_LOG_LEVEL = debug",
            ]
        );
        assert_eq!(config.session.step_forward_ms, 250);
        assert_eq!(config.session.duration_semantics, DurationSemantics::OutPoint);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_override_invalid_number() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(env(&[("CROPME_STEP_BACK_MS", "half")]));
        assert!(matches!(result, Err(CropMeError::ConfigError { .. })));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("CROPME_DURATION_SEMANTICS", "span")]))
            .unwrap();

        let cli = Cli::try_parse_from([
            "cropme",
            "--log-level",
            "trace",
            "session",
            "--semantics",
            "out-point",
        ])
        .unwrap();
        assert_eq!(config.apply_cli_overrides(&cli).unwrap().len(), 2);

        assert_eq!(config.logging.level, "trace");
        assert_eq!(
            config.session_settings().semantics,
            DurationSemantics::OutPoint
        );
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let cli = Cli::try_parse_from(["cropme", "--config", "/nonexistent/cropme.toml", "prefs"])
            .unwrap();
        let result = initialize_configuration_hierarchy(&cli);
        assert!(matches!(result, Err(CropMeError::ConfigError { .. })));
    }

    #[test]
    fn test_summary_records_file_and_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nstep_back_ms = 1000").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["cropme", "--config", &path, "--log-level", "warn", "prefs"])
            .unwrap();
        let (config, summary) = initialize_configuration_hierarchy(&cli).unwrap();

        assert_eq!(config.session.step_back_ms, 1_000);
        assert_eq!(summary.file.as_deref(), Some(file.path()));
        assert!(summary
            .overrides
            .contains(&"command line log_level = warn".to_string()));
    }
}
