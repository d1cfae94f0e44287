//! FFmpeg execution adapter
//!
//! Cuts a clip by stream-copying `[start, start + duration)` out of the
//! source with the `ffmpeg` binary. Progress comes from `-progress pipe:1`
//! on stdout; stderr is kept for error reporting.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Lines of encoder stderr kept in error messages
const STDERR_TAIL_LINES: usize = 5;

/// FFmpeg-based encoder adapter
pub struct FfmpegEncoderAdapter {
    binary: PathBuf,
}

impl FfmpegEncoderAdapter {
    /// Create new FFmpeg adapter
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for one export
    ///
    /// `-n` refuses to overwrite; the output path is expected to be free.
    pub fn build_args(request: &ExportRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-n", "-ss"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(request.start_arg().into());
        args.push("-i".into());
        args.push(request.source.clone().into_os_string());
        args.push("-t".into());
        args.push(request.duration_arg().into());
        for arg in [
            "-map", "0", "-vcodec", "copy", "-acodec", "copy", "-progress", "pipe:1", "-nostats",
        ] {
            args.push(arg.into());
        }
        args.push(request.output.clone().into_os_string());
        args
    }

    /// Apply one `key=value` line of ffmpeg progress output
    pub fn apply_progress_line(line: &str, progress: &mut ExportProgress) -> bool {
        let Some((key, value)) = line.trim().split_once('=') else {
            return false;
        };

        match key {
            // Despite the name, ffmpeg reports out_time_ms in microseconds
            "out_time_ms" | "out_time_us" => match value.parse::<i64>() {
                Ok(us) if us >= 0 => {
                    progress.out_time_ms = (us as u64 / 1_000).min(progress.total_ms);
                    true
                }
                _ => false,
            },
            "progress" if value == "end" => {
                progress.out_time_ms = progress.total_ms;
                progress.finished = true;
                true
            }
            _ => false,
        }
    }

    /// Remove what the encoder wrote, unless the file was there before it ran
    async fn discard_partial(output: &Path, preexisting: bool) {
        if preexisting {
            return;
        }
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!("Removed partial output {}", output.display()),
            Err(e) => debug!("No partial output removed: {}", e),
        }
    }

    fn stderr_tail(stderr: &str) -> String {
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }
}

#[async_trait]
impl EncoderPort for FfmpegEncoderAdapter {
    async fn encode(
        &self,
        request: &ExportRequest,
        progress: watch::Sender<ExportProgress>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<EncodeReport, DomainError> {
        let started = Instant::now();
        let args = Self::build_args(request);
        debug!("Running {} {:?}", self.binary.display(), args);
        let preexisting = tokio::fs::try_exists(&request.output).await.unwrap_or(false);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::ExportFailed(format!(
                    "could not start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DomainError::InternalError("encoder stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DomainError::InternalError("encoder stderr not captured".to_string()))?;

        let total_ms = request.duration_ms;
        let progress_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut current = ExportProgress::new(total_ms);
            while let Ok(Some(line)) = lines.next_line().await {
                if FfmpegEncoderAdapter::apply_progress_line(&line, &mut current) {
                    let _ = progress.send(current);
                }
            }
        });
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            let _ = stderr.read_to_string(&mut buffer).await;
            buffer
        });

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| DomainError::ExportFailed(e.to_string()))?,
            Ok(()) = &mut cancel => {
                info!("Cancelling export to {}", request.output.display());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill encoder: {}", e);
                }
                progress_task.abort();
                stderr_task.abort();
                Self::discard_partial(&request.output, preexisting).await;
                return Err(DomainError::Cancelled);
            }
        };

        let _ = progress_task.await;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            Self::discard_partial(&request.output, preexisting).await;
            let detail = Self::stderr_tail(&stderr_text);
            return Err(DomainError::ExportFailed(format!(
                "{} exited with {}{}{}",
                self.binary.display(),
                status,
                if detail.is_empty() { "" } else { ": " },
                detail
            )));
        }

        Ok(EncodeReport {
            output: request.output.clone(),
            elapsed: started.elapsed(),
        })
    }
}
