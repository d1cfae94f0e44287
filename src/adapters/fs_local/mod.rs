// Local file system adapter

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::domain::errors::*;
use crate::ports::*;

/// File system adapter over the local disk
#[derive(Debug, Default)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    /// Create new local fs adapter
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsPort for LocalFsAdapter {
    fn file_exists(&self, path: &Path) -> bool {
        // Anything occupying the name counts, including directories and dangling links
        path.symlink_metadata().is_ok()
    }

    async fn delete_file(&self, path: &Path) -> Result<(), DomainError> {
        tokio::fs::remove_file(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::FileNotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => {
                DomainError::DeleteFailed(format!("permission denied: {}", path.display()))
            }
            _ => DomainError::DeleteFailed(format!("{}: {}", path.display(), e)),
        })?;

        info!("Deleted {}", path.display());
        Ok(())
    }
}
