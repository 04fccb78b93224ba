//! Session context shared by the front-end
//!
//! A `Session` owns the configuration and the busy flag. Each action runs
//! on its own worker thread and reports back over a channel; only the
//! thread that owns the session applies results, so the activity log and
//! status list are never touched from a worker.

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::git::{GitRunner, SetupOutcome};
use crate::operations::{PathStatus, PushOutcome, RepoState, RepoSync, require_repo_dir};
use crate::system::System;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Work a session can run in the background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Derive the repository state
    State,
    /// Test a remote URL from the settings editor
    Probe { remote_url: String },
    /// Clone if needed, then make sure sparse checkout is configured
    Bootstrap,
    /// Make sure sparse checkout lists the tracked paths
    EnsureSparse,
    /// Recompute the per-path status list
    Refresh,
    Pull,
    /// Push with the given commit message
    Push { message: String },
}

/// Result of a finished action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    State(RepoState),
    Probe(SyncResult<String>),
    Setup(SyncResult<SetupOutcome>),
    Status(SyncResult<Vec<PathStatus>>),
    Pull(SyncResult<String>),
    Push(SyncResult<PushOutcome>),
    /// The pre-check found no changes, so no push was attempted
    NothingToPush,
}

/// Messages posted from workers to the owning loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A step inside a running action started
    Progress(String),
    /// An action finished; the busy flag is released when this is received
    Completed { action: Action, outcome: Outcome },
}

/// What the startup check decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Remote or local path missing; the user has to open the settings
    Unconfigured,
    /// No clone yet; a bootstrap was started
    Cloning,
    /// Clone present; a sparse checkout check was started
    Checking,
    /// Explicit list with a clone present; a status refresh was started
    Refreshing,
    /// Another action is still running
    Busy,
}

/// Explicit context passed to every front-end action
pub struct Session {
    config: Config,
    runner: Arc<dyn GitRunner>,
    system: Arc<dyn System>,
    busy: Arc<AtomicBool>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(config: Config, runner: Arc<dyn GitRunner>, system: Arc<dyn System>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            config,
            runner,
            system,
            busy: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx,
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the configuration; refused while an action is running
    ///
    /// # Errors
    ///
    /// Returns the new configuration back if the session is busy
    pub fn set_config(&mut self, config: Config) -> Result<(), Config> {
        if self.is_busy() {
            return Err(config);
        }
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn system(&self) -> &dyn System {
        &*self.system
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `action` on a worker thread
    ///
    /// Returns `false`, doing nothing, if another action is still running.
    /// Requests made while busy are dropped, not queued.
    pub fn submit(&self, action: Action) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Busy, ignoring {action:?}");
            return false;
        }

        let config = self.config.clone();
        let runner = Arc::clone(&self.runner);
        let system = Arc::clone(&self.system);
        let events = self.events_tx.clone();

        let spawned = thread::Builder::new()
            .name("tracksync-worker".to_owned())
            .spawn(move || {
                let outcome = execute(&action, &config, &*runner, &*system, &events);
                if events
                    .send(SessionEvent::Completed { action, outcome })
                    .is_err()
                {
                    warn!("Session dropped before the worker finished");
                }
            });

        match spawned {
            Ok(handle) => {
                *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                true
            }
            Err(e) => {
                warn!("Failed to start worker: {e}");
                self.busy.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Decide what to do when the front-end starts or settings change
    pub fn startup(&self) -> Startup {
        if !self.config.is_configured() {
            return Startup::Unconfigured;
        }
        let Some(repo_dir) = self.config.repo_dir(&*self.system) else {
            return Startup::Unconfigured;
        };

        let (action, startup) = if !self.config.tracked().is_sparse() {
            // explicit lists are synced in the user's own clone as is
            (Action::Refresh, Startup::Refreshing)
        } else if self.system.exists(&repo_dir.join(".git")) {
            (Action::EnsureSparse, Startup::Checking)
        } else {
            (Action::Bootstrap, Startup::Cloning)
        };

        if self.submit(action) { startup } else { Startup::Busy }
    }

    /// Wait up to `timeout` for the next worker message
    ///
    /// Receiving a `Completed` event releases the busy flag, so the flag is
    /// only ever cleared on the owning thread. A worker that exits without
    /// reporting (it panicked) is reaped here and releases the flag too.
    pub fn next_event(&self, timeout: Duration) -> Option<SessionEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(self.accept(event)),
            Err(_) => self.reap_worker(),
        }
    }

    fn accept(&self, event: SessionEvent) -> SessionEvent {
        if matches!(event, SessionEvent::Completed { .. }) {
            self.busy.store(false, Ordering::Release);
        }
        event
    }

    fn reap_worker(&self) -> Option<SessionEvent> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if !slot.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        // the worker may have sent its result just after the timeout fired
        if let Ok(event) = self.events_rx.try_recv() {
            return Some(self.accept(event));
        }
        if let Some(handle) = slot.take() {
            if handle.join().is_err() {
                warn!("Worker panicked before reporting a result");
            }
            self.busy.store(false, Ordering::Release);
        }
        None
    }

    /// Block until the running action completes, forwarding progress
    /// messages to `on_progress`
    pub fn wait_for_completion(&self, on_progress: &mut dyn FnMut(&str)) -> Option<Outcome> {
        while self.is_busy() {
            match self.next_event(Duration::from_millis(100)) {
                Some(SessionEvent::Progress(message)) => on_progress(&message),
                Some(SessionEvent::Completed { outcome, .. }) => return Some(outcome),
                None => {}
            }
        }
        None
    }
}

/// Run one action to completion on the current (worker) thread
fn execute(
    action: &Action,
    config: &Config,
    runner: &dyn GitRunner,
    system: &dyn System,
    events: &Sender<SessionEvent>,
) -> Outcome {
    let sync = RepoSync::new(runner, system);
    let tracked = config.tracked();

    match action {
        Action::State => Outcome::State(sync.repo_state(config)),
        Action::Probe { remote_url } => Outcome::Probe(sync.probe_connectivity(remote_url)),
        Action::Bootstrap => Outcome::Setup(require_repo_dir(config, system).and_then(|dir| {
            sync.bootstrap(&config.remote_url, &dir, config.branch(), &tracked)
        })),
        Action::EnsureSparse => Outcome::Setup(
            require_repo_dir(config, system)
                .and_then(|dir| sync.ensure_sparse_checkout(&dir, &tracked)),
        ),
        Action::Refresh => Outcome::Status(refresh(&sync, config, system)),
        Action::Pull => Outcome::Pull(
            require_repo_dir(config, system).and_then(|dir| sync.pull(&dir, config.branch())),
        ),
        Action::Push { message } => match require_repo_dir(config, system) {
            Err(e) => Outcome::Push(Err(e)),
            Ok(dir) if !sync.has_pending_changes(&dir, &tracked) => Outcome::NothingToPush,
            Ok(dir) => Outcome::Push(sync.push_with_progress(
                &dir,
                config.branch(),
                &tracked,
                message,
                &mut |step| {
                    if events.send(SessionEvent::Progress(step.to_string())).is_err() {
                        debug!("Session gone, dropping progress: {step}");
                    }
                },
            )),
        },
    }
}

fn refresh(
    sync: &RepoSync<'_>,
    config: &Config,
    system: &dyn System,
) -> SyncResult<Vec<PathStatus>> {
    let repo_dir = require_repo_dir(config, system)?;
    if !system.is_dir(&repo_dir) {
        return Err(SyncError::config_missing(
            "No repo configured or repo not found.",
        ));
    }
    Ok(sync.status(&repo_dir, &config.tracked()))
}
