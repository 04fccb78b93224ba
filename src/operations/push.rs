//! Push the tracked paths: pull, stage, commit, push

use crate::config::TrackedPaths;
use crate::error::{SyncError, SyncResult};
use crate::git::GitInvocation;
use crate::operations::RepoSync;
use core::fmt;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static NOTHING_TO_COMMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)nothing to commit").expect("pattern is valid"));

/// How a successful push ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Changes were pushed; carries git's stdout or "Push complete"
    Pushed(String),
    /// The commit step found nothing staged
    NothingToCommit,
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pushed(message) => f.write_str(message),
            Self::NothingToCommit => f.write_str("Nothing new to commit"),
        }
    }
}

/// Progress of a push, reported before each step starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStep {
    Syncing { branch: String },
    Staging { paths: String },
    Committing { message: String },
    Pushing { branch: String },
}

impl fmt::Display for PushStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syncing { branch } => write!(f, "Syncing with origin/{branch}…"),
            Self::Staging { paths } => write!(f, "Staging {paths}…"),
            Self::Committing { message } => write!(f, "Committing: \"{message}\"…"),
            Self::Pushing { branch } => write!(f, "Pushing to origin/{branch}…"),
        }
    }
}

/// True if git's output says the commit had nothing to record
#[must_use]
pub fn is_nothing_to_commit(output: &str) -> bool {
    NOTHING_TO_COMMIT.is_match(output)
}

impl RepoSync<'_> {
    /// Push the tracked paths without progress reporting
    ///
    /// # Errors
    ///
    /// See [`RepoSync::push_with_progress`]
    pub fn push(
        &self,
        repo_dir: &Path,
        branch: &str,
        tracked: &TrackedPaths,
        commit_message: &str,
    ) -> SyncResult<PushOutcome> {
        self.push_with_progress(repo_dir, branch, tracked, commit_message, &mut |_| {})
    }

    /// Pull, stage exactly the tracked paths, commit and push
    ///
    /// Stops at the first failing step. A commit that reports "nothing to
    /// commit" ends the push successfully whatever git's exit status.
    ///
    /// # Errors
    ///
    /// - "Pull failed before push: …" when the pre-pull fails
    /// - "Stage failed: …" when `git add` fails
    /// - "Commit failed: …" when the commit fails for another reason
    /// - git's push stderr (or stdout) when the push is rejected
    /// - a timeout error from any step
    pub fn push_with_progress(
        &self,
        repo_dir: &Path,
        branch: &str,
        tracked: &TrackedPaths,
        commit_message: &str,
        progress: &mut dyn FnMut(PushStep),
    ) -> SyncResult<PushOutcome> {
        info!("Starting push to origin/{branch}");

        // Step 1: Pull first so a remote that moved ahead does not reject us
        progress(PushStep::Syncing {
            branch: branch.to_owned(),
        });
        let output = self
            .run_pull(repo_dir, branch)
            .map_err(|e| e.in_step("Pull failed before push"))?;
        if !output.ok {
            return Err(SyncError::tool(format!(
                "Pull failed before push: {}",
                output.stderr
            )));
        }

        // Step 2: Stage the tracked paths, never a blanket add
        progress(PushStep::Staging {
            paths: tracked.describe(),
        });
        let args = ["add".to_owned(), "--".to_owned()]
            .into_iter()
            .chain(tracked.pathspecs());
        let output = self
            .runner
            .run(&GitInvocation::in_repo(repo_dir, args))
            .map_err(|e| e.in_step("Stage failed"))?;
        if !output.ok {
            return Err(SyncError::tool(format!("Stage failed: {}", output.stderr)));
        }

        // Step 3: Commit
        progress(PushStep::Committing {
            message: commit_message.to_owned(),
        });
        let output = self
            .runner
            .run(&GitInvocation::in_repo(repo_dir, ["commit", "-m", commit_message]))
            .map_err(|e| e.in_step("Commit failed"))?;
        if is_nothing_to_commit(&output.combined()) {
            debug!("Commit step found nothing to commit");
            return Ok(PushOutcome::NothingToCommit);
        }
        if !output.ok {
            return Err(SyncError::tool(format!("Commit failed: {}", output.stderr)));
        }

        // Step 4: Push
        progress(PushStep::Pushing {
            branch: branch.to_owned(),
        });
        let output = self
            .runner
            .run(&GitInvocation::in_repo(repo_dir, ["push", "origin", branch]))?;
        if !output.ok {
            return Err(SyncError::tool(output.error_message("Push failed")));
        }

        info!("Push to origin/{branch} complete");
        Ok(PushOutcome::Pushed(if output.stdout.is_empty() {
            "Push complete".to_owned()
        } else {
            output.stdout
        }))
    }
}
