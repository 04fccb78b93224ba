//! Repository bootstrap: clone with sparse checkout, and keeping the sparse
//! pattern list in line with the tracked paths

use crate::config::TrackedPaths;
use crate::error::{SyncError, SyncResult};
use crate::git::{CLONE_TIMEOUT, GitInvocation, GitRunner};
use crate::system::System;
use core::fmt;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Sparse checkout in non-cone mode needs Git 2.25+
pub const MIN_GIT_VERSION: (u32, u32, u32) = (2, 25, 0);

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern is valid")
});

/// What a setup step ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Fresh clone with sparse checkout applied
    Cloned,
    /// Existing clone whose sparse patterns were (re)written
    SparseConfigured,
    /// Existing clone already listing every tracked path
    AlreadyConfigured,
}

impl fmt::Display for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloned => f.write_str("Clone complete."),
            Self::SparseConfigured => f.write_str("Sparse checkout configured."),
            Self::AlreadyConfigured => f.write_str("Sparse checkout already configured."),
        }
    }
}

/// Performs and maintains the sparse checkout of the tracked paths
pub struct SparseCheckout<'src> {
    runner: &'src dyn GitRunner,
    system: &'src dyn System,
}

impl<'src> SparseCheckout<'src> {
    #[must_use]
    pub fn new(runner: &'src dyn GitRunner, system: &'src dyn System) -> Self {
        Self { runner, system }
    }

    /// Clone `remote_url` into `repo_dir` restricted to the tracked paths,
    /// or make sure an existing clone is restricted to them
    ///
    /// A failed step does not undo earlier ones: a clone that succeeded
    /// stays on disk even if the checkout after it fails.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error, prefixed with the step name
    pub fn bootstrap(
        &self,
        remote_url: &str,
        repo_dir: &Path,
        branch: &str,
        tracked: &TrackedPaths,
    ) -> SyncResult<SetupOutcome> {
        if self.system.exists(&repo_dir.join(".git")) {
            debug!("{} is already a clone", repo_dir.display());
            return self.ensure(repo_dir, tracked);
        }

        if remote_url.trim().is_empty() {
            return Err(SyncError::config_missing("Remote URL is not set"));
        }

        check_git_availability(self.runner)?;

        info!("Cloning {remote_url} into {}", repo_dir.display());

        // Step 1: Clone with filter and no checkout
        self.clone_repository(remote_url, repo_dir)?;
        debug!("Repository cloned");

        // Step 2 + 3: Restrict the working tree to the tracked paths
        self.init_sparse_checkout(repo_dir)?;
        self.set_sparse_patterns(repo_dir, tracked)?;
        debug!("Sparse checkout patterns set");

        // Step 4: Materialise the branch
        self.checkout_branch(repo_dir, branch)?;
        debug!("Branch {branch} checked out");

        Ok(SetupOutcome::Cloned)
    }

    /// Re-apply the sparse patterns unless every tracked path is already
    /// listed
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, prefixed with the step name
    pub fn ensure(&self, repo_dir: &Path, tracked: &TrackedPaths) -> SyncResult<SetupOutcome> {
        if self.is_configured(repo_dir, tracked)? {
            debug!("Sparse checkout already lists {}", tracked.describe());
            return Ok(SetupOutcome::AlreadyConfigured);
        }

        info!("Configuring sparse checkout for {}", tracked.describe());
        self.init_sparse_checkout(repo_dir)?;
        self.set_sparse_patterns(repo_dir, tracked)?;
        Ok(SetupOutcome::SparseConfigured)
    }

    /// Current sparse-checkout patterns, or `None` if the clone is not sparse
    ///
    /// # Errors
    ///
    /// Returns an error if the query times out or cannot be started
    pub fn patterns(&self, repo_dir: &Path) -> SyncResult<Option<Vec<String>>> {
        let output = self
            .runner
            .run(&GitInvocation::in_repo(repo_dir, ["sparse-checkout", "list"]))
            .map_err(|e| e.in_step("sparse-checkout list failed"))?;

        if !output.ok {
            debug!("sparse-checkout list failed: {}", output.stderr);
            return Ok(None);
        }

        Ok(Some(
            output
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }

    /// Whether every tracked path is among the sparse patterns
    ///
    /// # Errors
    ///
    /// Returns an error if the query times out or cannot be started
    pub fn is_configured(&self, repo_dir: &Path, tracked: &TrackedPaths) -> SyncResult<bool> {
        let Some(patterns) = self.patterns(repo_dir)? else {
            return Ok(false);
        };
        Ok(tracked
            .pathspecs()
            .iter()
            .all(|wanted| patterns.iter().any(|p| p == wanted)))
    }

    /// Clone the repository with blob filter and no checkout
    fn clone_repository(&self, remote_url: &str, repo_dir: &Path) -> SyncResult<()> {
        let invocation = GitInvocation::detached([
            "clone".to_owned(),
            "--filter=blob:none".to_owned(),
            "--no-checkout".to_owned(),
            remote_url.to_owned(),
            repo_dir.to_string_lossy().into_owned(),
        ])
        .with_timeout(CLONE_TIMEOUT, "Clone timed out");

        self.run_step(&invocation, "clone failed")
    }

    /// Initialize sparse checkout in non-cone mode
    fn init_sparse_checkout(&self, repo_dir: &Path) -> SyncResult<()> {
        self.run_step(
            &GitInvocation::in_repo(repo_dir, ["sparse-checkout", "init", "--no-cone"]),
            "sparse-checkout init failed",
        )
    }

    /// Set the sparse checkout patterns to the tracked paths
    fn set_sparse_patterns(&self, repo_dir: &Path, tracked: &TrackedPaths) -> SyncResult<()> {
        let args = ["sparse-checkout".to_owned(), "set".to_owned()]
            .into_iter()
            .chain(tracked.pathspecs());
        self.run_step(
            &GitInvocation::in_repo(repo_dir, args),
            "sparse-checkout set failed",
        )
    }

    /// Checkout the configured branch
    fn checkout_branch(&self, repo_dir: &Path, branch: &str) -> SyncResult<()> {
        self.run_step(
            &GitInvocation::in_repo(repo_dir, ["checkout", branch]),
            "checkout failed",
        )
    }

    fn run_step(&self, invocation: &GitInvocation, step: &str) -> SyncResult<()> {
        let output = self
            .runner
            .run(invocation)
            .map_err(|e| e.in_step(step))?;
        if !output.ok {
            warn!("{step}: {}", output.stderr);
        }
        output.into_step_result(step).map(|_| ())
    }
}

/// Check that git is available and new enough for non-cone sparse checkout
///
/// An unparseable version string is accepted.
///
/// # Errors
///
/// Returns an error if:
/// - The git command is not found or fails
/// - The git version is older than [`MIN_GIT_VERSION`]
pub fn check_git_availability(runner: &dyn GitRunner) -> SyncResult<()> {
    let output = runner
        .run(&GitInvocation::detached(["--version"]))
        .map_err(|e| {
            SyncError::tool(format!(
                "Git command not found. Please ensure Git is installed and available in PATH ({})",
                e.message()
            ))
        })?;

    if !output.ok {
        return Err(SyncError::tool("Git command failed to execute properly"));
    }

    match parse_git_version(&output.stdout) {
        Some(version) if version < MIN_GIT_VERSION => Err(SyncError::tool(format!(
            "Git version {}.{}.{} is too old. Sparse checkout requires Git 2.25.0 or later",
            version.0, version.1, version.2
        ))),
        Some(_) => Ok(()),
        None => {
            debug!("Could not parse git version from {:?}", output.stdout);
            Ok(())
        }
    }
}

/// Parse `git version X.Y[.Z]…` into `(major, minor, patch)`
#[must_use]
pub fn parse_git_version(version: &str) -> Option<(u32, u32, u32)> {
    let captures = VERSION_RE.captures(version)?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    let patch = captures
        .get(3)
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    Some((major, minor, patch))
}
