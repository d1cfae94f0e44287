use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use async_trait::async_trait;
use predicates::prelude::*;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch, Mutex};

use cropme::adapters::confirm_line::SharedLines;
use cropme::adapters::*;
use cropme::cli::repl::ReplSession;
use cropme::domain::model::*;
use cropme::domain::rules::OutputPathAllocator;
use cropme::ports::*;
use cropme::*;

/// Test utilities for the trim workflow
mod test_utils {
    use super::*;

    /// Probe that reports a fixed duration for every file
    pub struct FixedProbe(pub u64);

    #[async_trait]
    impl ProbePort for FixedProbe {
        async fn probe_duration_ms(&self, _path: &Path) -> Result<u64, DomainError> {
            Ok(self.0)
        }
    }

    /// Encoder that writes a placeholder clip and records what it was asked
    ///
    /// With `hold` set it keeps running until cancelled, then removes the clip.
    #[derive(Default)]
    pub struct RecordingEncoder {
        pub requests: StdMutex<Vec<ExportRequest>>,
        pub hold: AtomicBool,
    }

    #[async_trait]
    impl EncoderPort for RecordingEncoder {
        async fn encode(
            &self,
            request: &ExportRequest,
            _progress: watch::Sender<ExportProgress>,
            cancel: oneshot::Receiver<()>,
        ) -> Result<EncodeReport, DomainError> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::fs::write(&request.output, b"clip")
                .await
                .map_err(|e| DomainError::ExportFailed(e.to_string()))?;
            if self.hold.load(Ordering::SeqCst) {
                let _ = cancel.await;
                let _ = tokio::fs::remove_file(&request.output).await;
                return Err(DomainError::Cancelled);
            }
            Ok(EncodeReport {
                output: request.output.clone(),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    /// Previewer that only remembers what it was shown
    #[derive(Default)]
    pub struct RecordingPreview {
        pub shown: StdMutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl PreviewPort for RecordingPreview {
        async fn preview(&self, path: &Path) -> Result<(), DomainError> {
            self.shown.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    pub type ScriptLines = SharedLines<BufReader<&'static [u8]>>;

    pub fn script(input: &'static str) -> ScriptLines {
        Arc::new(Mutex::new(BufReader::new(input.as_bytes()).lines()))
    }

    /// Real file system and preference store in a temp dir, fake media tools
    pub struct Workspace {
        pub dir: TempDir,
        pub source: PathBuf,
        pub prefs_file: PathBuf,
        pub encoder: Arc<RecordingEncoder>,
        pub previewer: Arc<RecordingPreview>,
        pub playback: Arc<HeadlessPlaybackAdapter>,
        pub events: Option<mpsc::UnboundedReceiver<PlaybackEvent>>,
    }

    impl Workspace {
        pub fn new(duration_ms: u64) -> Self {
            let dir = TempDir::new().expect("Failed to create temp dir");
            let source = dir.path().join("sample.mp4");
            std::fs::write(&source, b"not really a video").unwrap();
            let prefs_file = dir.path().join("prefs").join("preferences.toml");

            let (playback, events) = HeadlessPlaybackAdapter::new(Arc::new(FixedProbe(duration_ms)));
            Self {
                dir,
                source,
                prefs_file,
                encoder: Arc::new(RecordingEncoder::default()),
                previewer: Arc::new(RecordingPreview::default()),
                playback: Arc::new(playback),
                events: Some(events),
            }
        }

        pub fn ports(&self, confirm: Arc<dyn ConfirmPort>) -> TrimPorts {
            TrimPorts {
                playback: self.playback.clone(),
                preferences: Arc::new(TomlPreferenceAdapter::new(&self.prefs_file)),
                encoder: self.encoder.clone(),
                previewer: self.previewer.clone(),
                fs: Arc::new(LocalFsAdapter::new()),
                confirm,
            }
        }

        pub async fn interactor(&self, lines: ScriptLines, semantics: DurationSemantics) -> TrimInteractor {
            let settings = SessionSettings {
                steps: StepConfig::default(),
                semantics,
            };
            let confirm = Arc::new(LineConfirmAdapter::new(lines));
            TrimInteractor::start(self.ports(confirm), settings).await
        }

        pub fn drain(&mut self, interactor: &mut TrimInteractor) {
            if let Some(events) = self.events.as_mut() {
                while let Ok(event) = events.try_recv() {
                    interactor.handle_playback_event(event);
                }
            }
        }

        pub fn clip(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }
    }
}

use test_utils::*;

// ============================================================================
// TRIM WORKFLOW
// ============================================================================

#[tokio::test]
async fn test_trim_workflow_end_to_end() {
    let mut ws = Workspace::new(10_000);
    let mut interactor = ws.interactor(script(""), DurationSemantics::Span).await;

    assert!(interactor.open(Some(ws.source.clone())).await.unwrap());
    ws.drain(&mut interactor);
    assert_eq!(interactor.session().duration_ms(), 10_000);
    assert_eq!(interactor.session().out_point_ms(), Some(10_000));
    assert_eq!(interactor.session().duration_label(), "0:10");

    interactor.toggle_playback().await.unwrap();
    interactor.seek(2_000).await.unwrap();
    ws.drain(&mut interactor);
    assert_eq!(interactor.session().position_label(), "0:02:000");
    interactor.mark_in().unwrap();

    let first = interactor.export().await.unwrap();
    assert_eq!(first, Some(ws.clip("0_sample.mp4")));
    assert!(ws.clip("0_sample.mp4").is_file());

    let second = interactor.export().await.unwrap();
    assert_eq!(second, Some(ws.clip("1_sample.mp4")));

    let requests = ws.encoder.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].start_arg(), "2.00");
    assert_eq!(requests[0].duration_arg(), "8.00");
    assert_eq!(requests[0].source, ws.source);
}

#[tokio::test]
async fn test_trim_workflow_legacy_duration() {
    let mut ws = Workspace::new(10_000);
    let mut interactor = ws.interactor(script(""), DurationSemantics::OutPoint).await;

    interactor.open(Some(ws.source.clone())).await.unwrap();
    ws.drain(&mut interactor);
    interactor.seek(2_000).await.unwrap();
    ws.drain(&mut interactor);
    interactor.mark_in().unwrap();
    interactor.export().await.unwrap();

    let requests = ws.encoder.requests.lock().unwrap().clone();
    assert_eq!(requests[0].start_arg(), "2.00");
    assert_eq!(requests[0].duration_arg(), "10.00");
}

#[tokio::test]
async fn test_seek_past_end_is_clamped_by_playback() {
    let mut ws = Workspace::new(10_000);
    let mut interactor = ws.interactor(script(""), DurationSemantics::Span).await;

    interactor.open(Some(ws.source.clone())).await.unwrap();
    interactor.seek(60_000).await.unwrap();
    ws.drain(&mut interactor);

    assert_eq!(interactor.session().current_position_ms(), 10_000);
}

#[tokio::test]
async fn test_export_without_range_never_calls_encoder() {
    let ws = Workspace::new(10_000);
    let mut interactor = ws.interactor(script(""), DurationSemantics::Span).await;

    interactor.open(Some(ws.source.clone())).await.unwrap();
    // Duration notification not delivered, so no out-point either
    assert!(matches!(
        interactor.export().await,
        Err(DomainError::RangeIncomplete(_))
    ));
    assert!(ws.encoder.requests.lock().unwrap().is_empty());
    assert!(!ws.clip("0_sample.mp4").exists());
}

#[tokio::test]
async fn test_delete_confirmed_from_input() {
    let mut ws = Workspace::new(10_000);
    let mut interactor = ws.interactor(script("n\ny\n"), DurationSemantics::Span).await;

    interactor.open(Some(ws.source.clone())).await.unwrap();
    ws.drain(&mut interactor);
    interactor.mark_in().unwrap();
    interactor.export().await.unwrap();

    assert!(!interactor.delete_source().await.unwrap());
    assert!(ws.source.exists());

    assert!(interactor.delete_source().await.unwrap());
    assert!(!ws.source.exists());
    assert_eq!(interactor.session().state(), SessionState::NoMedia);
    assert_eq!(
        interactor.session().last_exported_path(),
        Some(ws.clip("0_sample.mp4").as_path())
    );

    interactor.preview_last_export().await.unwrap();
    assert_eq!(ws.previewer.shown.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_preferences_survive_restart() {
    let ws = Workspace::new(10_000);

    let mut first = ws.interactor(script(""), DurationSemantics::Span).await;
    assert!(!first.preferences().autoplay);
    first.open(Some(ws.source.clone())).await.unwrap();
    assert!(first.toggle_autoplay().await.unwrap());
    drop(first);

    let second = ws.interactor(script(""), DurationSemantics::Span).await;
    assert!(second.session().autoplay_after_export());
    assert_eq!(second.browse_directory(), ws.dir.path());
}

#[tokio::test]
async fn test_autoplay_previews_new_clip() {
    let mut ws = Workspace::new(10_000);
    let mut interactor = ws.interactor(script(""), DurationSemantics::Span).await;
    interactor.toggle_autoplay().await.unwrap();

    interactor.open(Some(ws.source.clone())).await.unwrap();
    ws.drain(&mut interactor);
    interactor.mark_in().unwrap();
    interactor.export().await.unwrap();

    assert_eq!(
        *ws.previewer.shown.lock().unwrap(),
        vec![ws.clip("0_sample.mp4")]
    );
}

#[tokio::test]
async fn test_repl_script() {
    let mut ws = Workspace::new(10_000);
    let lines = script("status\nplay\nseek 2\nin\nexport\nbogus\nquit\n");
    let interactor = ws.interactor(script(""), DurationSemantics::Span).await;
    let events = ws.events.take().unwrap();

    let mut repl = ReplSession::new(interactor, ws.playback.clone(), events, lines);
    repl.run(Some(ws.source.clone())).await.unwrap();

    let session = repl.interactor().session();
    assert_eq!(session.in_point_ms(), Some(2_000));
    assert_eq!(
        session.last_exported_path(),
        Some(ws.clip("0_sample.mp4").as_path())
    );
    assert!(ws.clip("0_sample.mp4").is_file());
}

#[tokio::test]
async fn test_repl_cancel_stops_running_export() {
    let mut ws = Workspace::new(10_000);
    ws.encoder.hold.store(true, Ordering::SeqCst);
    let lines = script("cancel\nplay\nseek 2\nin\nexport\ncancel\nstatus\nquit\n");
    let interactor = ws.interactor(script(""), DurationSemantics::Span).await;
    let events = ws.events.take().unwrap();

    let mut repl = ReplSession::new(interactor, ws.playback.clone(), events, lines);
    repl.run(Some(ws.source.clone())).await.unwrap();

    let session = repl.interactor().session();
    assert_eq!(session.state(), SessionState::RangeMarked);
    assert_eq!(session.in_point_ms(), Some(2_000));
    assert_eq!(session.last_exported_path(), None);
    assert_eq!(ws.encoder.requests.lock().unwrap().len(), 1);
    assert!(!ws.clip("0_sample.mp4").exists());
}

// ============================================================================
// OUTPUT NAMING AGAINST A REAL DIRECTORY
// ============================================================================

#[test]
fn test_allocator_against_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let source = dir.path().join("clip.mov");
    std::fs::write(&source, b"").unwrap();
    for taken in ["0_clip.mov", "1_clip.mov", "3_clip.mov"] {
        std::fs::write(dir.path().join(taken), b"").unwrap();
    }

    let next = OutputPathAllocator::allocate(&source, |p| p.exists()).unwrap();
    assert_eq!(next, dir.path().join("2_clip.mov"));
}

// ============================================================================
// REAL FFMPEG
// ============================================================================

fn create_test_video(output_path: &Path, seconds: u32) -> bool {
    let status = std::process::Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={}:size=160x120:rate=25", seconds))
        .args(["-c:v", "mpeg4", "-y"])
        .arg(output_path)
        .status();
    matches!(status, Ok(status) if status.success())
}

#[tokio::test]
async fn test_real_ffmpeg_export() {
    let (Ok(ffmpeg), Ok(ffprobe)) = (which::which("ffmpeg"), which::which("ffprobe")) else {
        println!("Skipping real export test - ffmpeg not found");
        return;
    };

    let dir = TempDir::new().expect("Failed to create temp dir");
    let source = dir.path().join("sample video.mp4");
    if !create_test_video(&source, 4) {
        println!("Skipping real export test - could not generate sample");
        return;
    }

    let probe = FfprobeAdapter::new(ffprobe);
    let duration_ms = probe.probe_duration_ms(&source).await.unwrap();
    assert!((3_900..=4_100).contains(&duration_ms));

    let request = ExportRequest {
        source: source.clone(),
        output: dir.path().join("0_sample video.mp4"),
        start_ms: 1_000,
        duration_ms: 2_000,
    };
    let encoder = Arc::new(FfmpegEncoderAdapter::new(ffmpeg));
    let started = Instant::now();
    let mut job = ExportHandle::spawn(encoder, request.clone());

    match job.join().await {
        ExportOutcome::Completed(report) => {
            assert_eq!(report.output, request.output);
            assert!(std::fs::metadata(&request.output).unwrap().len() > 0);
            let clip_ms = probe.probe_duration_ms(&request.output).await.unwrap();
            assert!(clip_ms <= 2_500, "clip is {} ms", clip_ms);
            println!("Real export passed in {:?}", started.elapsed());
        }
        other => panic!("Real export failed: {:?}", other),
    }
}

// ============================================================================
// COMMAND LINE
// ============================================================================

fn cropme(dir: &TempDir) -> Command {
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = Command::cargo_bin("cropme").unwrap();
    cmd.env("CROPME_CONFIG", &config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_prefs_defaults() {
    let dir = TempDir::new().unwrap();
    let prefs = dir.path().join("preferences.toml");

    cropme(&dir)
        .args(["prefs", "--prefs-file"])
        .arg(&prefs)
        .assert()
        .success()
        .stdout(predicate::str::contains("Autoplay: off"));
}

#[test]
fn test_cli_prefs_toggle_persists() {
    let dir = TempDir::new().unwrap();
    let prefs = dir.path().join("preferences.toml");

    cropme(&dir)
        .env("CROPME_PREFS_FILE", &prefs)
        .args(["prefs", "--toggle-autoplay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Autoplay: on"));
    assert!(prefs.is_file());

    let output = cropme(&dir)
        .env("CROPME_PREFS_FILE", &prefs)
        .args(["prefs", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["autoplay"], serde_json::Value::Bool(true));
}

#[test]
fn test_cli_missing_config_fails() {
    let dir = TempDir::new().unwrap();

    cropme(&dir)
        .args(["--config"])
        .arg(dir.path().join("missing.toml"))
        .arg("prefs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_cli_trim_rejects_bad_time() {
    let dir = TempDir::new().unwrap();

    cropme(&dir)
        .args(["trim", "--input", "clip.mp4", "--start", "soon", "--end", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid start time"));
}
