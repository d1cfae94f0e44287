//! Previewer that hands the exported clip to an external viewer

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::ports::*;

/// Launches `ffplay` (or another viewer) on the clip without waiting for it
pub struct FfplayPreviewAdapter {
    binary: PathBuf,
    args: Vec<String>,
}

impl FfplayPreviewAdapter {
    /// Viewer with extra arguments placed before the clip path
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// `ffplay -autoexit <clip>`
    pub fn ffplay(binary: impl Into<PathBuf>) -> Self {
        Self::new(binary, vec!["-autoexit".to_string()])
    }
}

#[async_trait]
impl PreviewPort for FfplayPreviewAdapter {
    async fn preview(&self, path: &Path) -> Result<(), DomainError> {
        if !path.is_file() {
            return Err(DomainError::PreviewFailed(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                DomainError::PreviewFailed(format!(
                    "could not start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        info!("Previewing {}", path.display());

        // Reap the viewer in the background so it does not linger as a zombie
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("Previewer exited with {}", status),
                Err(e) => debug!("Previewer wait failed: {}", e),
            }
        });
        Ok(())
    }
}
