//! Time parsing and formatting utilities

use crate::error::{CropMeError, CropMeResult};

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Split milliseconds into (hours mod 24, minutes, seconds, millis), truncating
fn components(ms: u64) -> (u64, u64, u64, u64) {
    let hours = (ms / MS_PER_HOUR) % 24;
    let minutes = (ms / MS_PER_MINUTE) % 60;
    let seconds = (ms / MS_PER_SECOND) % 60;
    (hours, minutes, seconds, ms % MS_PER_SECOND)
}

/// Format milliseconds as `H:MM:SS`, or `M:SS` below one hour
pub fn format_hhmmss(ms: u64) -> String {
    let (hours, minutes, seconds, _) = components(ms);
    if ms >= MS_PER_HOUR {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Same as [`format_hhmmss`] with the millisecond remainder appended as `:mmm`
pub fn format_hhmmss_millis(ms: u64) -> String {
    let (_, _, _, millis) = components(ms);
    format!("{}:{:03}", format_hhmmss(ms), millis)
}

/// Time parser for user-entered timestamps
pub struct TimeParser;

impl TimeParser {
    /// Create a new time parser
    pub fn new() -> Self {
        Self
    }
}

impl Default for TimeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeParser {
    /// Parse `SS[.ms]`, `M:SS[.ms]` or `H:MM:SS[.ms]` to milliseconds
    pub fn parse_millis(&self, time_str: &str) -> CropMeResult<u64> {
        let time_str = time_str.trim();
        let invalid = || CropMeError::InvalidTimeFormat {
            time: time_str.to_string(),
        };

        let parts: Vec<&str> = time_str.split(':').collect();
        let seconds = match parts.as_slice() {
            [secs] => self.parse_seconds(secs, None)?,
            [mins, secs] => {
                let minutes = self.parse_whole(mins)?;
                minutes * 60.0 + self.parse_seconds(secs, Some(60.0))?
            }
            [hours, mins, secs] => {
                let hours = self.parse_whole(hours)?;
                let minutes = self.parse_whole(mins)?;
                if minutes >= 60.0 {
                    return Err(invalid());
                }
                hours * 3600.0 + minutes * 60.0 + self.parse_seconds(secs, Some(60.0))?
            }
            _ => return Err(invalid()),
        };

        // Positions are signed milliseconds downstream
        let millis = (seconds * 1000.0).round();
        if millis >= i64::MAX as f64 {
            return Err(invalid());
        }
        Ok(millis as u64)
    }

    fn parse_whole(&self, part: &str) -> CropMeResult<f64> {
        part.parse::<u32>()
            .map(f64::from)
            .map_err(|_| CropMeError::InvalidTimeFormat {
                time: part.to_string(),
            })
    }

    fn parse_seconds(&self, part: &str, limit: Option<f64>) -> CropMeResult<f64> {
        let seconds: f64 = part.parse().map_err(|_| CropMeError::InvalidTimeFormat {
            time: part.to_string(),
        })?;

        if !seconds.is_finite() || seconds < 0.0 || limit.is_some_and(|max| seconds >= max) {
            return Err(CropMeError::InvalidTimeFormat {
                time: part.to_string(),
            });
        }
        Ok(seconds)
    }
}
