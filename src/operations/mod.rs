//! Operations module
//!
//! The repo sync controller: connectivity probe, bootstrap, status, pull and
//! push against the external git executable

pub mod probe;
pub mod pull;
pub mod push;
pub mod status;

pub use push::{PushOutcome, PushStep};
pub use status::{PathStatus, StatusKind};

use crate::config::{Config, TrackedPaths};
use crate::error::{SyncError, SyncResult};
use crate::git::{GitRunner, SetupOutcome, SparseCheckout};
use crate::system::System;
use core::fmt;
use std::path::{Path, PathBuf};

/// Where a configured repository stands; derived on demand, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// Remote URL or local path not set
    Unconfigured,
    /// No `.git` at the local path yet
    NotCloned,
    /// Cloned, but sparse checkout does not list every tracked path
    ClonedNoSparse,
    Ready,
}

impl fmt::Display for RepoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unconfigured => "unconfigured",
            Self::NotCloned => "not_cloned",
            Self::ClonedNoSparse => "cloned_no_sparse",
            Self::Ready => "ready",
        };
        f.write_str(label)
    }
}

/// Sequences git commands for the tracked paths of one repository
///
/// Stateless: every operation takes the repository it acts on, so one
/// controller can be built per worker.
pub struct RepoSync<'src> {
    runner: &'src dyn GitRunner,
    system: &'src dyn System,
}

impl<'src> RepoSync<'src> {
    #[must_use]
    pub fn new(runner: &'src dyn GitRunner, system: &'src dyn System) -> Self {
        Self { runner, system }
    }

    fn sparse(&self) -> SparseCheckout<'src> {
        SparseCheckout::new(self.runner, self.system)
    }

    /// Clone with sparse checkout if needed, otherwise make sure the
    /// existing clone is sparse on the tracked paths
    ///
    /// Only the sparse folder is ever cloned here. An explicit list works in
    /// a clone the user already has.
    ///
    /// # Errors
    ///
    /// - `ConfigInvalid` for an explicit list
    /// - the first failing step's error, prefixed with the step name
    pub fn bootstrap(
        &self,
        remote_url: &str,
        repo_dir: &Path,
        branch: &str,
        tracked: &TrackedPaths,
    ) -> SyncResult<SetupOutcome> {
        if !tracked.is_sparse() {
            return Err(SyncError::config_invalid(
                "Explicit files and folders are synced in an existing clone; only the sparse folder is cloned",
            ));
        }
        self.sparse().bootstrap(remote_url, repo_dir, branch, tracked)
    }

    /// Re-apply sparse checkout unless it already lists every tracked path
    ///
    /// An explicit list lives in an ordinary clone, so nothing is run for it.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, prefixed with the step name
    pub fn ensure_sparse_checkout(
        &self,
        repo_dir: &Path,
        tracked: &TrackedPaths,
    ) -> SyncResult<SetupOutcome> {
        if !tracked.is_sparse() {
            return Ok(SetupOutcome::AlreadyConfigured);
        }
        self.sparse().ensure(repo_dir, tracked)
    }

    /// Derive the repository state for a configuration
    #[must_use]
    pub fn repo_state(&self, config: &Config) -> RepoState {
        if !config.is_configured() {
            return RepoState::Unconfigured;
        }
        let Some(repo_dir) = config.repo_dir(self.system) else {
            return RepoState::Unconfigured;
        };
        if !self.system.exists(&repo_dir.join(".git")) {
            return RepoState::NotCloned;
        }
        let tracked = config.tracked();
        if !tracked.is_sparse() {
            return RepoState::Ready;
        }
        match self.sparse().is_configured(&repo_dir, &tracked) {
            Ok(true) => RepoState::Ready,
            Ok(false) | Err(_) => RepoState::ClonedNoSparse,
        }
    }
}

/// Resolve the clone directory, refusing to run git without one
///
/// # Errors
///
/// Returns `ConfigMissing` when `repo_path` is blank
pub fn require_repo_dir(config: &Config, system: &dyn System) -> SyncResult<PathBuf> {
    config
        .repo_dir(system)
        .ok_or_else(|| SyncError::config_missing("Please configure the repo first."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{MockGit, ToolOutput};
    use crate::system::MockSystem;

    fn configured() -> Config {
        Config {
            remote_url: "git@example.com:me/site.git".into(),
            repo_path: "/r".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_state_unconfigured() {
        let git = MockGit::new();
        let system = MockSystem::new();
        let sync = RepoSync::new(&git, &system);
        assert_eq!(sync.repo_state(&Config::default()), RepoState::Unconfigured);
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_state_not_cloned() {
        let git = MockGit::new();
        let system = MockSystem::new().with_dir("/r");
        let sync = RepoSync::new(&git, &system);
        assert_eq!(sync.repo_state(&configured()), RepoState::NotCloned);
    }

    #[test]
    fn test_state_cloned_without_sparse() {
        let git = MockGit::new().on(
            &["sparse-checkout", "list"],
            ToolOutput::failure("fatal: this worktree is not sparse"),
        );
        let system = MockSystem::new().with_dir("/r/.git");
        let sync = RepoSync::new(&git, &system);
        assert_eq!(sync.repo_state(&configured()), RepoState::ClonedNoSparse);
    }

    #[test]
    fn test_state_ready() {
        let git = MockGit::new().on(
            &["sparse-checkout", "list"],
            ToolOutput::success("images/portfolio"),
        );
        let system = MockSystem::new().with_dir("/r/.git");
        let sync = RepoSync::new(&git, &system);
        assert_eq!(sync.repo_state(&configured()), RepoState::Ready);
        assert_eq!(RepoState::Ready.to_string(), "ready");
    }

    fn list_config() -> Config {
        Config {
            repo_path: "/r".into(),
            files: Some(vec!["a.txt".into()]),
            folders: Some(vec![]),
            ..Config::default()
        }
    }

    #[test]
    fn test_list_variant_is_ready_without_sparse_checkout() {
        let git = MockGit::new();
        let system = MockSystem::new().with_dir("/r/.git");
        let sync = RepoSync::new(&git, &system);
        assert_eq!(sync.repo_state(&list_config()), RepoState::Ready);
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_list_variant_never_touches_sparse_checkout() {
        let git = MockGit::new();
        let system = MockSystem::new().with_dir("/r/.git");
        let sync = RepoSync::new(&git, &system);
        let tracked = list_config().tracked();

        assert_eq!(
            sync.ensure_sparse_checkout(Path::new("/r"), &tracked).unwrap(),
            SetupOutcome::AlreadyConfigured
        );
        let err = sync
            .bootstrap("git@example.com:me/site.git", Path::new("/r"), "main", &tracked)
            .unwrap_err();
        assert!(matches!(err, SyncError::ConfigInvalid { .. }));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_require_repo_dir() {
        let system = MockSystem::new();
        let err = require_repo_dir(&Config::default(), &system).unwrap_err();
        assert!(matches!(err, SyncError::ConfigMissing { .. }));
        assert_eq!(
            require_repo_dir(&configured(), &system).unwrap(),
            PathBuf::from("/r")
        );
    }
}
