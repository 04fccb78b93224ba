//! One-shot command implementations
//!
//! Each command submits one action to the session, waits for it behind a
//! spinner and prints the result.

use crate::cli::{CommandKind, SettingsArgs, SettingsCommand};
use crate::config::settings::to_pretty_json;
use crate::error::SyncError;
use crate::session::{Action, Outcome, Session};
use crate::ui::progress::spinner;
use crate::ui::render::{Indicator, status_lines, subtitle};
use crate::utils::path::validate_tracked_path;
use anyhow::{Result, anyhow};
use std::path::Path;
use tracing::{debug, info};

/// Run a one-shot command against the session
///
/// # Errors
///
/// Returns the action's `SyncError` so the caller can pick the exit code
pub fn execute(command: &CommandKind, session: &mut Session, config_path: &Path) -> Result<()> {
    debug!("Executing {command:?}");
    match command {
        CommandKind::State => execute_state(session),
        CommandKind::Probe { remote_url } => execute_probe(session, remote_url.as_deref()),
        CommandKind::Bootstrap => execute_bootstrap(session),
        CommandKind::Status { json } => execute_status(session, *json),
        CommandKind::Pull => execute_pull(session),
        CommandKind::Push { message } => execute_push(session, message.as_deref()),
        CommandKind::Settings(SettingsCommand::Show) => {
            println!("{}", to_pretty_json(session.config())?);
            Ok(())
        }
        CommandKind::Settings(SettingsCommand::Set(set)) => {
            execute_settings_set(session, set, config_path)
        }
        CommandKind::Interactive => Err(anyhow!("The interactive session is not a one-shot command")),
    }
}

/// Submit `action` and block until it finishes, showing step messages on
/// the spinner
fn run_action(session: &Session, action: Action, message: &str) -> Result<Outcome> {
    if !session.submit(action) {
        return Err(anyhow!("Another action is still running"));
    }
    let bar = spinner(message);
    let outcome = session.wait_for_completion(&mut |step| bar.set_message(step.to_owned()));
    bar.finish_and_clear();
    outcome.ok_or_else(|| anyhow!("Worker stopped without reporting a result"))
}

fn unexpected(outcome: &Outcome) -> anyhow::Error {
    anyhow!("Unexpected outcome {outcome:?}")
}

fn execute_state(session: &Session) -> Result<()> {
    match run_action(session, Action::State, "Checking repository…")? {
        Outcome::State(state) => {
            println!("{state}");
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

fn execute_probe(session: &Session, remote_url: Option<&str>) -> Result<()> {
    let remote_url = remote_url
        .unwrap_or(session.config().remote_url.as_str())
        .trim()
        .to_owned();
    if remote_url.is_empty() {
        return Err(SyncError::config_missing("Enter a Remote URL first.").into());
    }

    match run_action(session, Action::Probe { remote_url }, "Testing…")? {
        Outcome::Probe(Ok(message)) => {
            println!("✓  {message}");
            Ok(())
        }
        Outcome::Probe(Err(e)) => Err(e.into()),
        other => Err(unexpected(&other)),
    }
}

fn execute_bootstrap(session: &Session) -> Result<()> {
    if !session.config().is_configured() {
        return Err(SyncError::config_missing(
            "No repo configured. Run `tracksync settings set` to get started.",
        )
        .into());
    }

    match run_action(session, Action::Bootstrap, "Cloning…")? {
        Outcome::Setup(Ok(setup)) => {
            info!("Bootstrap finished: {setup:?}");
            println!("{setup}");
            Ok(())
        }
        Outcome::Setup(Err(e)) => Err(e.in_step("Clone failed").into()),
        other => Err(unexpected(&other)),
    }
}

fn execute_status(session: &Session, json: bool) -> Result<()> {
    match run_action(session, Action::Refresh, "Checking status…")? {
        Outcome::Status(Ok(statuses)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&statuses)?);
            } else {
                println!("{}", subtitle(session.config(), session.system()));
                for line in status_lines(&statuses) {
                    println!("{line}");
                }
                println!("{}", Indicator::from_statuses(&statuses));
            }
            Ok(())
        }
        Outcome::Status(Err(e)) => Err(e.into()),
        other => Err(unexpected(&other)),
    }
}

fn execute_pull(session: &Session) -> Result<()> {
    let message = format!("Pulling from origin/{}…", session.config().branch());
    match run_action(session, Action::Pull, &message)? {
        Outcome::Pull(Ok(detail)) => {
            println!("Pull complete — {detail}");
            Ok(())
        }
        Outcome::Pull(Err(e)) => Err(e.in_step("Pull failed").into()),
        other => Err(unexpected(&other)),
    }
}

fn execute_push(session: &Session, message: Option<&str>) -> Result<()> {
    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map_or_else(|| session.config().default_commit_message(), str::to_owned);
    let status = format!("Starting push to origin/{}…", session.config().branch());

    match run_action(session, Action::Push { message }, &status)? {
        Outcome::Push(Ok(result)) => {
            println!("{result}");
            Ok(())
        }
        Outcome::NothingToPush => {
            println!("Nothing to push — all tracked files are up to date.");
            Ok(())
        }
        Outcome::Push(Err(e)) => Err(e.in_step("Push failed").into()),
        other => Err(unexpected(&other)),
    }
}

fn execute_settings_set(session: &mut Session, set: &SettingsArgs, config_path: &Path) -> Result<()> {
    let mut config = session.config().clone();
    config.apply(set.to_update());
    if set.sparse {
        config.files = None;
        config.folders = None;
    }

    for entry in config.tracked().entries() {
        validate_tracked_path(&entry.path)?;
    }

    config.save_to_file(session.system(), config_path)?;
    session
        .set_config(config)
        .map_err(|_| anyhow!("Another action is still running"))?;

    info!("Settings saved to {}", config_path.display());
    println!("Settings saved.");
    println!("{}", subtitle(session.config(), session.system()));
    Ok(())
}
