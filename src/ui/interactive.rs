//! Interactive front-end loop
//!
//! The loop owns the `Session`: it reads commands from an input channel,
//! starts actions, and is the only place results are applied. Workers
//! never write to the output.

use crate::config::{Config, SettingsUpdate};
use crate::git::SetupOutcome;
use crate::operations::PathStatus;
use crate::session::{Action, Outcome, Session, SessionEvent, Startup};
use crate::ui::log::{ActivityLog, LogLevel};
use crate::ui::render::{Indicator, status_lines, subtitle};
use crate::utils::path::validate_tracked_path;
use anyhow::Result;
use std::io::{self, BufRead as _, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::debug;

const EVENT_POLL: Duration = Duration::from_millis(50);

const HELP: &str = "\
Commands:
  pull                 pull from origin
  push [message]       commit and push the tracked paths
  refresh              recompute the status list
  state                show where the repository stands
  message <text>       set the commit message for the next push
  probe [url]          test the connection to a remote
  settings             show the current settings
  set <key> <value>    change a setting and save it
                       keys: remote_url, repo_path, branch, commit_message,
                             files, folders (comma separated)
  help                 show this help
  quit                 leave";

/// Forward stdin lines to a channel from a background thread
#[must_use]
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

enum Flow {
    Continue,
    Quit,
}

/// State owned by the interactive loop
pub struct Frontend<W: Write> {
    session: Session,
    config_path: PathBuf,
    log: ActivityLog,
    out: W,
    commit_message: String,
    statuses: Vec<PathStatus>,
    indicator: Indicator,
}

impl<W: Write> Frontend<W> {
    pub fn new(session: Session, config_path: PathBuf, out: W) -> Self {
        let commit_message = session.config().default_commit_message();
        Self {
            session,
            config_path,
            log: ActivityLog::new(),
            out,
            commit_message,
            statuses: Vec::new(),
            indicator: Indicator::Idle,
        }
    }

    #[must_use]
    pub const fn log(&self) -> &ActivityLog {
        &self.log
    }

    #[must_use]
    pub fn statuses(&self) -> &[PathStatus] {
        &self.statuses
    }

    #[must_use]
    pub const fn indicator(&self) -> Indicator {
        self.indicator
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Run until `quit` or until input closes and no action is running
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails
    pub fn run(&mut self, input: &Receiver<String>) -> Result<()> {
        let header = subtitle(self.session.config(), self.session.system());
        writeln!(self.out, "tracksync — {header}")?;
        writeln!(self.out, "Type `help` for commands.")?;
        self.startup_check()?;

        loop {
            while let Some(event) = self.session.next_event(EVENT_POLL) {
                self.handle_event(event)?;
            }
            // commands wait while an action runs, like disabled buttons
            if self.session.is_busy() {
                continue;
            }

            match input.try_recv() {
                Ok(line) => {
                    if matches!(self.handle_command(&line)?, Flow::Quit) {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => break,
            }
        }

        self.out.flush()?;
        Ok(())
    }

    fn emit(&mut self, level: LogLevel, message: impl Into<String>) -> io::Result<()> {
        let line = self.log.append(level, message).to_string();
        writeln!(self.out, "{line}")
    }

    fn startup_check(&mut self) -> io::Result<()> {
        match self.session.startup() {
            Startup::Unconfigured => {
                self.indicator = Indicator::Idle;
                self.emit(
                    LogLevel::Warn,
                    "No repo configured. Use `set remote_url …` and `set repo_path …` to get started.",
                )
            }
            Startup::Cloning => {
                self.indicator = Indicator::Busy;
                self.emit(
                    LogLevel::Step,
                    "Repo not found locally — starting initial clone…",
                )
            }
            Startup::Checking | Startup::Refreshing => {
                self.indicator = Indicator::Busy;
                Ok(())
            }
            Startup::Busy => Ok(()),
        }
    }

    fn submit(&mut self, action: Action) -> bool {
        let started = self.session.submit(action);
        if started {
            self.indicator = Indicator::Busy;
        }
        started
    }

    fn handle_command(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));
        debug!("command {command:?} {rest:?}");

        match command {
            "" => {}
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => writeln!(self.out, "{HELP}")?,
            "pull" => self.on_pull()?,
            "push" => self.on_push(rest)?,
            "refresh" => {
                self.submit(Action::Refresh);
            }
            "state" => {
                self.submit(Action::State);
            }
            "message" => {
                self.commit_message = rest.to_owned();
            }
            "probe" => self.on_probe(rest)?,
            "settings" => {
                let json = crate::config::settings::to_pretty_json(self.session.config())?;
                writeln!(self.out, "{json}")?;
            }
            "set" => self.on_set(rest)?,
            other => writeln!(self.out, "Unknown command '{other}'. Type `help`.")?,
        }
        Ok(Flow::Continue)
    }

    fn repo_ready(&mut self) -> io::Result<bool> {
        if self.session.config().repo_path.trim().is_empty() {
            self.emit(LogLevel::Warn, "Please configure the repo first.")?;
            return Ok(false);
        }
        Ok(true)
    }

    fn on_pull(&mut self) -> io::Result<()> {
        if self.session.is_busy() || !self.repo_ready()? {
            return Ok(());
        }
        let branch = self.session.config().branch().to_owned();
        if self.submit(Action::Pull) {
            self.emit(LogLevel::Step, format!("Pulling from origin/{branch}…"))?;
        }
        Ok(())
    }

    fn on_push(&mut self, message: &str) -> io::Result<()> {
        if self.session.is_busy() || !self.repo_ready()? {
            return Ok(());
        }
        let message = if !message.is_empty() {
            message.to_owned()
        } else if !self.commit_message.trim().is_empty() {
            self.commit_message.trim().to_owned()
        } else {
            self.session.config().default_commit_message()
        };
        let branch = self.session.config().branch().to_owned();
        if self.submit(Action::Push { message }) {
            self.emit(LogLevel::Step, format!("Starting push to origin/{branch}…"))?;
        }
        Ok(())
    }

    fn on_probe(&mut self, url: &str) -> io::Result<()> {
        let url = if url.is_empty() {
            self.session.config().remote_url.trim().to_owned()
        } else {
            url.to_owned()
        };
        if url.is_empty() {
            return self.emit(LogLevel::Warn, "Enter a Remote URL first.");
        }
        if self.submit(Action::Probe { remote_url: url }) {
            self.emit(LogLevel::Step, "Testing…")?;
        }
        Ok(())
    }

    fn on_set(&mut self, args: &str) -> Result<()> {
        let Some((key, value)) = args
            .split_once(char::is_whitespace)
            .map(|(k, v)| (k, v.trim()))
            .or_else(|| (!args.is_empty()).then_some((args, "")))
        else {
            writeln!(self.out, "Usage: set <key> <value>")?;
            return Ok(());
        };

        let list = || -> Vec<String> {
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .collect()
        };

        let mut update = SettingsUpdate::default();
        match key {
            "remote_url" => update.remote_url = Some(value.to_owned()),
            "repo_path" => update.repo_path = Some(value.to_owned()),
            "branch" => update.branch = Some(value.to_owned()),
            "commit_message" => update.commit_message = Some(value.to_owned()),
            "files" => update.files = Some(list()),
            "folders" => update.folders = Some(list()),
            other => {
                writeln!(self.out, "Unknown setting '{other}'")?;
                return Ok(());
            }
        }

        let mut config: Config = self.session.config().clone();
        config.apply(update);

        // Repository checks wait until the list is complete; unsafe paths never do
        for entry in config.tracked().entries() {
            if let Err(e) = validate_tracked_path(&entry.path) {
                self.emit(LogLevel::Error, e.to_string())?;
                return Ok(());
            }
        }

        if self.session.is_busy() {
            self.emit(LogLevel::Warn, "Busy — try again when the current action finishes.")?;
            return Ok(());
        }

        config.save_to_file(self.session.system(), &self.config_path)?;
        if self.session.set_config(config).is_err() {
            self.emit(LogLevel::Warn, "Busy — try again when the current action finishes.")?;
            return Ok(());
        }

        self.emit(LogLevel::Step, "Settings saved.")?;
        let header = subtitle(self.session.config(), self.session.system());
        writeln!(self.out, "{header}")?;
        self.startup_check()?;
        Ok(())
    }

    fn handle_event(&mut self, event: SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::Progress(message) => self.emit(LogLevel::Step, format!("  {message}")),
            SessionEvent::Completed { action, outcome } => self.handle_outcome(&action, outcome),
        }
    }

    fn handle_outcome(&mut self, action: &Action, outcome: Outcome) -> io::Result<()> {
        match outcome {
            Outcome::State(state) => {
                self.indicator = Indicator::Idle;
                self.emit(LogLevel::Info, format!("Repository state: {state}"))
            }
            Outcome::Probe(Ok(message)) => {
                self.indicator = Indicator::Idle;
                self.emit(LogLevel::Success, format!("✓  {message}"))
            }
            Outcome::Probe(Err(e)) => {
                self.indicator = Indicator::Idle;
                self.emit(LogLevel::Error, format!("✗  {e}"))
            }
            Outcome::Setup(Ok(setup)) => {
                match setup {
                    SetupOutcome::Cloned => self.emit(LogLevel::Success, setup.to_string())?,
                    SetupOutcome::SparseConfigured => {
                        let tracked = self.session.config().tracked().describe();
                        self.emit(
                            LogLevel::Success,
                            format!("Sparse checkout configured — only {tracked} on disk."),
                        )?;
                    }
                    SetupOutcome::AlreadyConfigured => {}
                }
                self.submit(Action::Refresh);
                Ok(())
            }
            Outcome::Setup(Err(e)) => {
                self.indicator = Indicator::Error;
                let prefix = if matches!(action, Action::Bootstrap) {
                    "Clone failed"
                } else {
                    "Sparse checkout setup failed"
                };
                self.emit(LogLevel::Error, format!("{prefix}: {e}"))
            }
            Outcome::Status(Ok(statuses)) => {
                for line in status_lines(&statuses) {
                    writeln!(self.out, "{line}")?;
                }
                self.indicator = Indicator::from_statuses(&statuses);
                self.statuses = statuses;
                self.commit_message = self.session.config().default_commit_message();
                Ok(())
            }
            Outcome::Status(Err(e)) => {
                self.indicator = Indicator::Error;
                self.statuses.clear();
                writeln!(self.out, "  {}", e.message())
            }
            Outcome::Pull(Ok(detail)) => {
                self.emit(LogLevel::Success, format!("Pull complete — {detail}"))?;
                self.submit(Action::Refresh);
                Ok(())
            }
            Outcome::Pull(Err(e)) => {
                self.indicator = Indicator::Error;
                self.emit(LogLevel::Error, format!("Pull failed: {e}"))
            }
            Outcome::Push(Ok(result)) => {
                self.emit(LogLevel::Success, result.to_string())?;
                self.submit(Action::Refresh);
                Ok(())
            }
            Outcome::Push(Err(e)) => {
                self.indicator = Indicator::Error;
                self.emit(LogLevel::Error, format!("Push failed: {e}"))
            }
            Outcome::NothingToPush => {
                self.indicator = Indicator::Ok;
                self.emit(
                    LogLevel::Warn,
                    "Nothing to push — all tracked files are up to date.",
                )
            }
        }
    }
}
