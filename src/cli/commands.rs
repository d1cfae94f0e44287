//! Command implementations

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::TomlPreferenceAdapter;
use crate::app::{DefaultAppContainer, TrimInteractor};
use crate::cli::args::{PrefsArgs, SessionArgs, TrimArgs};
use crate::cli::repl::ReplSession;
use crate::config_initialization::AppConfig;
use crate::domain::model::*;
use crate::ports::PreferencePort;
use crate::utils::path::display_name;
use crate::utils::time::{format_hhmmss_millis, TimeParser};

/// Run the interactive session
pub async fn session(config: &AppConfig, prefs_file: Option<PathBuf>, args: SessionArgs) -> Result<()> {
    let mut container =
        DefaultAppContainer::new(config, prefs_file).context("Failed to set up media tools")?;
    let events = container
        .take_playback_events()
        .ok_or_else(|| anyhow!("Playback events already taken"))?;
    let interactor = container.trim_interactor().await;

    let mut repl = ReplSession::new(interactor, container.playback(), events, container.lines());
    repl.run(args.input).await
}

/// Cut one range from the command line
pub async fn trim(config: &AppConfig, prefs_file: Option<PathBuf>, args: TrimArgs) -> Result<()> {
    info!("Starting trim operation");
    info!("Input: {}", args.input.display());

    let parser = TimeParser::new();
    let start_ms = parser
        .parse_millis(&args.start)
        .with_context(|| format!("Invalid start time '{}'", args.start))?;
    let end_ms = parser
        .parse_millis(&args.end)
        .with_context(|| format!("Invalid end time '{}'", args.end))?;

    let mut container =
        DefaultAppContainer::new(config, prefs_file).context("Failed to set up media tools")?;
    let mut events = container
        .take_playback_events()
        .ok_or_else(|| anyhow!("Playback events already taken"))?;
    let mut interactor = container.trim_interactor().await;

    interactor.open(Some(args.input.clone())).await?;
    drain_events(&mut interactor, &mut events);
    if interactor.playback_status() == PlaybackStatus::Playing {
        interactor.toggle_playback().await?;
    }

    interactor.seek(i64::try_from(start_ms)?).await?;
    drain_events(&mut interactor, &mut events);
    interactor.mark_in()?;

    interactor.seek(i64::try_from(end_ms)?).await?;
    drain_events(&mut interactor, &mut events);
    let out_ms = interactor.mark_out()?;
    if out_ms != end_ms {
        warn!(
            "End time is past the end of the video; using {}",
            format_hhmmss_millis(out_ms)
        );
    }

    let mut job = interactor.start_export()?;
    let mut progress = job.subscribe();
    let mut progress_open = true;

    enum Step {
        Done(ExportOutcome),
        Progress(bool),
        Interrupt,
    }

    let outcome = loop {
        let step = tokio::select! {
            outcome = job.join() => Step::Done(outcome),
            changed = progress.changed(), if progress_open => Step::Progress(changed.is_ok()),
            _ = tokio::signal::ctrl_c() => Step::Interrupt,
        };

        match step {
            Step::Done(outcome) => break outcome,
            Step::Progress(true) => {
                let percent = progress.borrow().percent();
                eprint!(
                    "\rExporting {}... {:>3.0}%",
                    display_name(&job.request().output),
                    percent
                );
                let _ = std::io::stderr().flush();
            }
            Step::Progress(false) => progress_open = false,
            Step::Interrupt => {
                if job.cancel() {
                    eprintln!("\nCancelling export...");
                }
            }
        }
    };
    eprintln!();

    let Some(output) = interactor.finish_export(outcome).await? else {
        bail!("Export cancelled");
    };

    if args.preview && !interactor.session().autoplay_after_export() {
        interactor.preview_last_export().await?;
    }

    info!("Trim operation completed successfully");
    println!("{}", output.display());
    Ok(())
}

/// Show or change stored preferences
pub async fn prefs(prefs_file: Option<PathBuf>, args: PrefsArgs) -> Result<()> {
    let adapter = match prefs_file {
        Some(path) => TomlPreferenceAdapter::new(path),
        None => TomlPreferenceAdapter::at_default_location(),
    };

    let mut preferences = adapter.load().await?;
    if args.toggle_autoplay {
        preferences.autoplay = !preferences.autoplay;
        adapter
            .save(&preferences)
            .await
            .context("Failed to save preferences")?;
        info!("Autoplay set to {}", preferences.autoplay);
    }

    if args.json {
        let report = serde_json::json!({
            "file": adapter.path(),
            "directory": preferences.directory,
            "autoplay": preferences.autoplay,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Preferences: {}", adapter.path().display());
        println!("Directory: {}", preferences.directory.display());
        println!(
            "Autoplay: {}",
            if preferences.autoplay { "on" } else { "off" }
        );
    }

    Ok(())
}

fn drain_events(
    interactor: &mut TrimInteractor,
    events: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
) {
    while let Ok(event) = events.try_recv() {
        interactor.handle_playback_event(event);
    }
}
