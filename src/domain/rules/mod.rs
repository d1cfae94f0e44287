// Domain rules - Business logic and policies

use std::path::{Path, PathBuf};

use crate::domain::errors::*;
use crate::domain::model::*;


/// Upper bound on candidate names tried before giving up
pub const MAX_COLLISION_PROBES: u64 = 100_000;

/// Business rules for naming exported clips
///
/// Clips land next to their source as `<counter>_<basename>`, using the
/// first counter (starting at 0) that does not name an existing file.
pub struct OutputPathAllocator;

impl OutputPathAllocator {
    /// Candidate path for a given counter value
    pub fn candidate(source: &Path, counter: u64) -> Result<PathBuf, DomainError> {
        let file_name = source.file_name().ok_or_else(|| {
            DomainError::BadArgs(format!("Source has no file name: {}", source.display()))
        })?;

        let mut name = std::ffi::OsString::from(format!("{}_", counter));
        name.push(file_name);

        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        Ok(dir.join(name))
    }

    /// Allocate the first free candidate, probing with `exists`
    pub fn allocate<F>(source: &Path, mut exists: F) -> Result<PathBuf, DomainError>
    where
        F: FnMut(&Path) -> bool,
    {
        Self::allocate_bounded(source, MAX_COLLISION_PROBES, &mut exists)
    }

    /// Allocate with an explicit probe limit
    pub fn allocate_bounded<F>(
        source: &Path,
        max_probes: u64,
        mut exists: F,
    ) -> Result<PathBuf, DomainError>
    where
        F: FnMut(&Path) -> bool,
    {
        for counter in 0..max_probes {
            let candidate = Self::candidate(source, counter)?;
            if !exists(&candidate) {
                return Ok(candidate);
            }
        }

        Err(DomainError::OutputPathExhausted(format!(
            "{} candidates already exist for {}",
            max_probes,
            source.display()
        )))
    }
}

/// Business rules for turning a marked range into an encoder request
pub struct ExportPlanner;

impl ExportPlanner {
    /// Validate the marked points and build the request
    pub fn plan(
        source: &Path,
        output: PathBuf,
        in_point_ms: Option<u64>,
        out_point_ms: Option<u64>,
        semantics: DurationSemantics,
    ) -> Result<ExportRequest, DomainError> {
        let (start_ms, end_ms) = Self::validate_range(in_point_ms, out_point_ms)?;

        Ok(ExportRequest {
            source: source.to_path_buf(),
            output,
            start_ms,
            duration_ms: semantics.duration_ms(start_ms, end_ms),
        })
    }

    /// Both points must be set and the out-point must lie after the in-point
    pub fn validate_range(
        in_point_ms: Option<u64>,
        out_point_ms: Option<u64>,
    ) -> Result<(u64, u64), DomainError> {
        let start = in_point_ms
            .ok_or_else(|| DomainError::RangeIncomplete("in-point is not set".to_string()))?;
        let end = out_point_ms
            .ok_or_else(|| DomainError::RangeIncomplete("out-point is not set".to_string()))?;

        if end <= start {
            return Err(DomainError::InvalidTimeRange(format!(
                "out-point ({} ms) must be after in-point ({} ms)",
                end, start
            )));
        }

        Ok((start, end))
    }
}
