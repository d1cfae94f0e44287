//! Interactive trimming session on stdin/stdout
//!
//! One command per line. Playback notifications, the playback clock and a
//! running export are serviced between lines, so the prompt stays
//! responsive while ffmpeg works.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::adapters::confirm_line::SharedLines;
use crate::adapters::HeadlessPlaybackAdapter;
use crate::app::{ExportHandle, TrimInteractor};
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::session::TrimSession;
use crate::utils::path::display_name;
use crate::utils::time::{format_hhmmss_millis, TimeParser};

const TICK: Duration = Duration::from_millis(250);

const HELP: &str = "\
Commands:
  open <file>     load a video (no file cancels)
  seek <time>     jump to a time (H:MM:SS.ms, M:SS.ms, or seconds)
  in / out        mark the in-point / out-point at the current position
  fwd / back      step forward / back
  play            toggle play and pause
  export          cut the marked range next to the source
  cancel          stop the running export
  delete          delete the loaded file (asks first)
  autoplay        toggle previewing clips after export
  preview         show the last exported clip
  status          show the session
  quit            leave";

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Open(Option<PathBuf>),
    Seek(u64),
    MarkIn,
    MarkOut,
    StepForward,
    StepBack,
    PlayPause,
    Export,
    Cancel,
    Delete,
    ToggleAutoplay,
    Preview,
    Status,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse one line; blank lines yield `None`
    pub fn parse(line: &str, parser: &TimeParser) -> Result<Option<Self>, DomainError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "open" | "o" => {
                let path = rest.trim_matches(|c| c == '"' || c == '\'');
                ReplCommand::Open((!path.is_empty()).then(|| PathBuf::from(path)))
            }
            "seek" | "s" => {
                if rest.is_empty() {
                    return Err(DomainError::BadArgs("seek needs a time".to_string()));
                }
                let target = parser
                    .parse_millis(rest)
                    .map_err(|e| DomainError::BadArgs(e.to_string()))?;
                ReplCommand::Seek(target)
            }
            "in" | "i" => ReplCommand::MarkIn,
            "out" => ReplCommand::MarkOut,
            "fwd" | "forward" | "f" => ReplCommand::StepForward,
            "back" | "b" => ReplCommand::StepBack,
            "play" | "pause" | "p" => ReplCommand::PlayPause,
            "export" | "x" => ReplCommand::Export,
            "cancel" => ReplCommand::Cancel,
            "delete" | "del" => ReplCommand::Delete,
            "autoplay" => ReplCommand::ToggleAutoplay,
            "preview" => ReplCommand::Preview,
            "status" | "st" => ReplCommand::Status,
            "help" | "?" => ReplCommand::Help,
            "quit" | "q" | "exit" => ReplCommand::Quit,
            other => {
                return Err(DomainError::BadArgs(format!(
                    "unknown command '{}', try 'help'",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

/// Session summary printed by `status`
pub fn render_status(
    session: &TrimSession,
    playback: PlaybackStatus,
    progress: Option<ExportProgress>,
) -> String {
    let mut out = String::new();

    match session.source_path() {
        Some(path) => out.push_str(&format!(
            "File: {} [{}]\n",
            display_name(path),
            session.state()
        )),
        None => out.push_str(&format!("File: none [{}]\n", session.state())),
    }
    if session.source_path().is_some() {
        let transport = match playback {
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        };
        out.push_str(&format!(
            "Position: {} / {} ({})\n",
            session.position_label(),
            session.duration_label(),
            transport
        ));
        let point = |value: Option<u64>| {
            value
                .map(format_hhmmss_millis)
                .unwrap_or_else(|| "-".to_string())
        };
        out.push_str(&format!(
            "In: {}  Out: {}\n",
            point(session.in_point_ms()),
            point(session.out_point_ms())
        ));
    }
    if let Some(error) = session.media_error() {
        out.push_str(&format!("{}\n", error));
    }
    if let Some(progress) = progress {
        out.push_str(&format!("Export: {:.0}%\n", progress.percent()));
    }
    out.push_str(&format!(
        "Autoplay: {}\n",
        if session.autoplay_after_export() { "on" } else { "off" }
    ));
    if let Some(path) = session.last_exported_path() {
        out.push_str(&format!("Last export: {}\n", path.display()));
    }
    out
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Export(ExportOutcome),
    Playback(PlaybackEvent),
    Tick,
}

/// Interactive loop around one trim interactor
pub struct ReplSession<R> {
    interactor: TrimInteractor,
    playback: Arc<HeadlessPlaybackAdapter>,
    events: mpsc::UnboundedReceiver<PlaybackEvent>,
    lines: SharedLines<R>,
    job: Option<ExportHandle>,
    parser: TimeParser,
}

impl<R> ReplSession<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(
        interactor: TrimInteractor,
        playback: Arc<HeadlessPlaybackAdapter>,
        events: mpsc::UnboundedReceiver<PlaybackEvent>,
        lines: SharedLines<R>,
    ) -> Self {
        Self {
            interactor,
            playback,
            events,
            lines,
            job: None,
            parser: TimeParser::new(),
        }
    }

    pub fn interactor(&self) -> &TrimInteractor {
        &self.interactor
    }

    /// Run until `quit` or end of input
    pub async fn run(&mut self, initial: Option<PathBuf>) -> anyhow::Result<()> {
        println!("CropMe interactive session. Type 'help' for commands.");
        if initial.is_some() {
            self.dispatch(ReplCommand::Open(initial)).await;
        }

        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        prompt();

        loop {
            let input = tokio::select! {
                line = read_line(&self.lines) => Input::Line(line),
                outcome = wait_export(&mut self.job) => Input::Export(outcome),
                Some(event) = self.events.recv() => Input::Playback(event),
                _ = ticker.tick() => Input::Tick,
            };

            match input {
                Input::Line(Ok(Some(line))) => {
                    match ReplCommand::parse(&line, &self.parser) {
                        Ok(Some(command)) => {
                            if self.dispatch(command).await == Flow::Quit {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    }
                    prompt();
                }
                Input::Line(Ok(None)) => break,
                Input::Line(Err(e)) => {
                    warn!("Reading input failed: {}", e);
                    break;
                }
                Input::Export(outcome) => {
                    self.job = None;
                    self.finish_export(outcome).await;
                    prompt();
                }
                Input::Playback(event) => {
                    let is_error = matches!(event, PlaybackEvent::Error(_));
                    self.interactor.handle_playback_event(event);
                    if is_error {
                        self.print_status();
                    }
                }
                Input::Tick => self.playback.tick().await,
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn dispatch(&mut self, command: ReplCommand) -> Flow {
        debug!("Command: {:?}", command);
        self.drain_events();
        let result = match command {
            ReplCommand::Open(path) => match self.interactor.open(path).await {
                Ok(true) => {
                    self.drain_events();
                    Ok(())
                }
                Ok(false) => {
                    println!("Open cancelled");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            ReplCommand::Seek(target) => {
                self.interactor
                    .seek(i64::try_from(target).unwrap_or(i64::MAX))
                    .await
            }
            ReplCommand::MarkIn => self.interactor.mark_in().map(|_| self.print_status()),
            ReplCommand::MarkOut => self.interactor.mark_out().map(|_| self.print_status()),
            ReplCommand::StepForward => self.interactor.step_forward().await.map(print_target),
            ReplCommand::StepBack => self.interactor.step_back().await.map(print_target),
            ReplCommand::PlayPause => self.interactor.toggle_playback().await.map(|status| {
                println!("{}", if status == PlaybackStatus::Playing { "Playing" } else { "Paused" })
            }),
            ReplCommand::Export => match self.interactor.start_export() {
                Ok(job) => {
                    self.job = Some(job);
                    self.print_status();
                    Ok(())
                }
                Err(e) => Err(e),
            },
            ReplCommand::Cancel => {
                if self.job.as_mut().is_some_and(|job| job.cancel()) {
                    println!("Cancelling export...");
                } else {
                    println!("No export running");
                }
                Ok(())
            }
            ReplCommand::Delete => self.interactor.delete_source().await.map(|deleted| {
                if deleted {
                    self.print_status();
                } else {
                    println!("Delete cancelled");
                }
            }),
            ReplCommand::ToggleAutoplay => {
                self.interactor.toggle_autoplay().await.map(|_| self.print_status())
            }
            ReplCommand::Preview => self.interactor.preview_last_export().await,
            ReplCommand::Status => {
                let progress = self.job.as_ref().map(ExportHandle::progress);
                print!(
                    "{}",
                    render_status(
                        self.interactor.session(),
                        self.interactor.playback_status(),
                        progress
                    )
                );
                Ok(())
            }
            ReplCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ReplCommand::Quit => return Flow::Quit,
        };

        if let Err(e) = result {
            match self.interactor.status() {
                Some(status) => println!("{}", status),
                None => println!("{}", e),
            }
        }
        Flow::Continue
    }

    async fn finish_export(&mut self, outcome: ExportOutcome) {
        // Failures are reported through the status line
        let _ = self.interactor.finish_export(outcome).await;
        self.print_status();
    }

    /// Apply notifications that are already queued
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.interactor.handle_playback_event(event);
        }
    }

    fn print_status(&self) {
        if let Some(status) = self.interactor.status() {
            println!("{}", status);
        }
    }

    /// Stop a running export so no partial clip is left behind
    async fn shutdown(&mut self) {
        if let Some(mut job) = self.job.take() {
            job.cancel();
            let outcome = job.join().await;
            self.finish_export(outcome).await;
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_target(target_ms: i64) {
    println!("Seek to {}", format_hhmmss_millis(target_ms.max(0) as u64));
}

async fn read_line<R>(lines: &SharedLines<R>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    lines.lock().await.next_line().await
}

async fn wait_export(job: &mut Option<ExportHandle>) -> ExportOutcome {
    match job {
        Some(job) => job.join().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn parse(line: &str) -> Result<Option<ReplCommand>, DomainError> {
        ReplCommand::parse(line, &TimeParser::new())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("  ").unwrap(), None);
        assert_eq!(parse("in").unwrap(), Some(ReplCommand::MarkIn));
        assert_eq!(parse("OUT").unwrap(), Some(ReplCommand::MarkOut));
        assert_eq!(parse("fwd").unwrap(), Some(ReplCommand::StepForward));
        assert_eq!(parse("b").unwrap(), Some(ReplCommand::StepBack));
        assert_eq!(parse("x").unwrap(), Some(ReplCommand::Export));
        assert_eq!(parse("quit").unwrap(), Some(ReplCommand::Quit));
    }

    #[test]
    fn test_parse_open() {
        assert_eq!(
            parse("open /videos/my clip.mp4").unwrap(),
            Some(ReplCommand::Open(Some(PathBuf::from("/videos/my clip.mp4"))))
        );
        assert_eq!(
            parse("open \"/videos/a.mp4\"").unwrap(),
            Some(ReplCommand::Open(Some(PathBuf::from("/videos/a.mp4"))))
        );
        assert_eq!(parse("open").unwrap(), Some(ReplCommand::Open(None)));
    }

    #[test]
    fn test_parse_seek() {
        assert_eq!(parse("seek 1:01.250").unwrap(), Some(ReplCommand::Seek(61_250)));
        assert_eq!(parse("s 2").unwrap(), Some(ReplCommand::Seek(2_000)));
        assert!(matches!(parse("seek"), Err(DomainError::BadArgs(_))));
        assert!(matches!(parse("seek soon"), Err(DomainError::BadArgs(_))));
        assert!(matches!(
            parse("seek 10000000000000000000"),
            Err(DomainError::BadArgs(_))
        ));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(parse("rewind"), Err(DomainError::BadArgs(_))));
    }

    #[test]
    fn test_render_status_without_media() {
        let session = TrimSession::new(true, StepConfig::default(), DurationSemantics::Span);
        let text = render_status(&session, PlaybackStatus::Stopped, None);
        assert!(text.contains("File: none [no media]"));
        assert!(text.contains("Autoplay: on"));
        assert!(!text.contains("Position"));
    }

    #[test]
    fn test_render_status_with_range() {
        let mut session = TrimSession::new(false, StepConfig::default(), DurationSemantics::Span);
        session.open(PathBuf::from("/videos/sample.mp4")).unwrap();
        session.on_duration_changed(10_000);
        session.on_position_changed(2_000);
        session.mark_in().unwrap();

        let progress = ExportProgress {
            out_time_ms: 4_000,
            total_ms: 8_000,
            finished: false,
        };
        let text = render_status(&session, PlaybackStatus::Paused, Some(progress));

        assert!(text.contains("File: sample.mp4"));
        assert!(text.contains("Position: 0:02:000 / 0:10 (paused)"));
        assert!(text.contains("In: 0:02:000  Out: 0:10:000"));
        assert!(text.contains("Export: 50%"));
        assert!(!text.contains("Last export"));
        assert!(session.source_path() == Some(Path::new("/videos/sample.mp4")));
    }
}
