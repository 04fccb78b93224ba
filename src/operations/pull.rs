//! Pull from the remote branch

use crate::error::{SyncError, SyncResult};
use crate::git::{GitInvocation, ToolOutput};
use crate::operations::RepoSync;
use std::path::Path;
use tracing::{debug, info};

impl RepoSync<'_> {
    /// `git pull origin <branch>`
    ///
    /// Returns git's stdout, or "Already up to date" when it printed
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns git's stderr (or "Unknown error") when the pull fails, or a
    /// timeout error
    pub fn pull(&self, repo_dir: &Path, branch: &str) -> SyncResult<String> {
        info!("Pulling from origin/{branch}");
        let output = self.run_pull(repo_dir, branch)?;

        if !output.ok {
            debug!("pull failed: {}", output.stderr);
            return Err(SyncError::tool(if output.stderr.is_empty() {
                "Unknown error".to_owned()
            } else {
                output.stderr
            }));
        }

        if output.stdout.is_empty() {
            Ok("Already up to date".to_owned())
        } else {
            Ok(output.stdout)
        }
    }

    pub(crate) fn run_pull(&self, repo_dir: &Path, branch: &str) -> SyncResult<ToolOutput> {
        self.runner
            .run(&GitInvocation::in_repo(repo_dir, ["pull", "origin", branch]))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SyncError;
    use crate::git::{MockGit, ToolOutput};
    use crate::operations::RepoSync;
    use crate::system::MockSystem;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_pull_reports_stdout() {
        let git = MockGit::new().on(&["pull"], ToolOutput::success("Fast-forward\n a.txt | 2 +-"));
        let system = MockSystem::new();
        let message = RepoSync::new(&git, &system)
            .pull(Path::new("/r"), "main")
            .unwrap();
        assert!(message.starts_with("Fast-forward"));

        let call = &git.calls()[0];
        assert_eq!(call.repo, Some(PathBuf::from("/r")));
        assert_eq!(call.args, vec!["pull", "origin", "main"]);
    }

    #[test]
    fn test_pull_empty_stdout() {
        let git = MockGit::new().on(&["pull"], ToolOutput::success(""));
        let system = MockSystem::new();
        assert_eq!(
            RepoSync::new(&git, &system)
                .pull(Path::new("/r"), "main")
                .unwrap(),
            "Already up to date"
        );
    }

    #[test]
    fn test_pull_failure_surfaces_stderr() {
        let git = MockGit::new().on(
            &["pull"],
            ToolOutput::failure("fatal: couldn't find remote ref live"),
        );
        let system = MockSystem::new();
        let err = RepoSync::new(&git, &system)
            .pull(Path::new("/r"), "live")
            .unwrap_err();
        assert_eq!(err, SyncError::tool("fatal: couldn't find remote ref live"));
    }
}
