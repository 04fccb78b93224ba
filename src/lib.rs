//! `tracksync` - one-button pull/push for a fixed set of tracked paths
//!
//! This library drives the external `git` executable to keep a sparse,
//! partial clone of one repository in sync: it clones only the tracked
//! paths, reports their status, pulls, and commits and pushes them without
//! touching anything else in the working tree.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod operations;
pub mod session;
pub mod system;
pub mod ui;
pub mod utils;

use anyhow::Result;
use cli::{Args, CommandKind};
use config::Config;
use git::{GitRunner, RealGit};
use session::Session;
use std::io;
use std::sync::Arc;
use system::{RealSystem, System};
use tracing::debug;
use ui::interactive::{Frontend, spawn_stdin_reader};

/// Main entry point for the tracksync library
///
/// # Errors
///
/// Returns a `SyncError` (possibly wrapped) when the configuration is
/// invalid or the command fails
pub fn run(args: Args) -> Result<()> {
    let system: Arc<dyn System> = Arc::new(RealSystem::new());
    let runner: Arc<dyn GitRunner> = Arc::new(RealGit::with_program(&args.git));
    run_with(args, runner, system)
}

/// Run with injected collaborators
///
/// # Errors
///
/// See [`run`]
pub fn run_with(args: Args, runner: Arc<dyn GitRunner>, system: Arc<dyn System>) -> Result<()> {
    let config = Config::load_from_file(&*system, &args.config)?;
    debug!("Loaded settings from {}", args.config.display());

    let command = args.command.unwrap_or(CommandKind::Interactive);

    // The settings editor has to work on a broken configuration
    if !matches!(command, CommandKind::Settings(_)) {
        config.validate(&*system)?;
    }

    let mut session = Session::new(config, runner, system);
    match command {
        CommandKind::Interactive => {
            let input = spawn_stdin_reader();
            Frontend::new(session, args.config, io::stdout()).run(&input)
        }
        other => cli::commands::execute(&other, &mut session, &args.config),
    }
}
