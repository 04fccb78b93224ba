//! # `tracksync`
//!
//! `tracksync` keeps a fixed set of files and folders of one Git repository
//! in sync with a single pull or push, for people who should not have to
//! learn git.
//!
//! ## Features
//! - Partial, sparse clone that only materialises the tracked paths.
//! - Per-path status: up to date, changed, missing.
//! - Pull, and a push that stages only the tracked paths.
//! - Interactive session with an activity log, or one-shot subcommands.
//!
//! ## Usage
//!
//! ```sh
//! tracksync settings set --remote-url git@github.com:me/site.git --repo-path ~/site
//! tracksync bootstrap
//! tracksync push -m "New photos"
//! ```
//!
//! Run `tracksync` without a subcommand for the interactive session.

use anyhow::Result;
use clap::Parser as _;
use std::io;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};
use tracksync::cli::Args;
use tracksync::error::SyncError;

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    match tracksync::run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(err.downcast_ref::<SyncError>().map_or(1, SyncError::exit_code));
        }
    }
}
