//! Path helpers shared by adapters and the CLI

use std::path::{Path, PathBuf};

use crate::error::{CropMeError, CropMeResult};

/// Directory that contains `path`, falling back to the current directory
pub fn containing_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Resolve an executable by explicit path or by searching `PATH`
pub fn resolve_binary(name_or_path: &Path) -> CropMeResult<PathBuf> {
    if name_or_path.components().count() > 1 {
        if name_or_path.is_file() {
            return Ok(name_or_path.to_path_buf());
        }
        return Err(CropMeError::BinaryNotFound {
            name: name_or_path.display().to_string(),
        });
    }

    which::which(name_or_path).map_err(|_| CropMeError::BinaryNotFound {
        name: name_or_path.display().to_string(),
    })
}

/// File name for display, or the whole path if it has none
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
