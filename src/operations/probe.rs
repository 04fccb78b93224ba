//! Connectivity probe against the remote

use crate::error::{SyncError, SyncResult};
use crate::git::{GitInvocation, PROBE_TIMEOUT};
use crate::operations::RepoSync;
use tracing::debug;

impl RepoSync<'_> {
    /// List the remote's heads to check it is reachable
    ///
    /// Touches nothing locally.
    ///
    /// # Errors
    ///
    /// - `ConfigMissing` if `remote_url` is blank
    /// - `ToolTimeout` ("Connection timed out") after 15 seconds
    /// - `ToolExecution` with git's stderr, or "Connection failed"
    pub fn probe_connectivity(&self, remote_url: &str) -> SyncResult<String> {
        let remote_url = remote_url.trim();
        if remote_url.is_empty() {
            return Err(SyncError::config_missing("Enter a Remote URL first."));
        }

        debug!("Probing {remote_url}");
        let invocation = GitInvocation::detached(["ls-remote", "--heads", remote_url])
            .with_timeout(PROBE_TIMEOUT, "Connection timed out");
        let output = self.runner.run(&invocation)?;

        if output.ok {
            Ok("Connection successful".to_owned())
        } else {
            let message = if output.stderr.is_empty() {
                "Connection failed".to_owned()
            } else {
                output.stderr
            };
            Err(SyncError::tool(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SyncError;
    use crate::git::{MockGit, PROBE_TIMEOUT, ToolOutput};
    use crate::operations::RepoSync;
    use crate::system::MockSystem;

    #[test]
    fn test_probe_success() {
        let git = MockGit::new().on(&["ls-remote"], ToolOutput::success("abc\trefs/heads/main"));
        let system = MockSystem::new();
        let sync = RepoSync::new(&git, &system);

        assert_eq!(
            sync.probe_connectivity(" https://example.com/site.git ").unwrap(),
            "Connection successful"
        );
        let call = &git.calls()[0];
        assert_eq!(call.repo, None);
        assert_eq!(call.timeout, PROBE_TIMEOUT);
        assert_eq!(
            call.args,
            vec!["ls-remote", "--heads", "https://example.com/site.git"]
        );
    }

    #[test]
    fn test_probe_failure_messages() {
        let system = MockSystem::new();

        let git = MockGit::new().on(&["ls-remote"], ToolOutput::failure("Repository not found"));
        let err = RepoSync::new(&git, &system)
            .probe_connectivity("url")
            .unwrap_err();
        assert_eq!(err.to_string(), "Repository not found");

        let git = MockGit::new().on(&["ls-remote"], ToolOutput::failure(""));
        let err = RepoSync::new(&git, &system)
            .probe_connectivity("url")
            .unwrap_err();
        assert_eq!(err.to_string(), "Connection failed");

        let git = MockGit::new().on_timeout(&["ls-remote"]);
        let err = RepoSync::new(&git, &system)
            .probe_connectivity("url")
            .unwrap_err();
        assert_eq!(err, SyncError::timeout("Connection timed out"));
    }

    #[test]
    fn test_probe_requires_url() {
        let git = MockGit::new();
        let system = MockSystem::new();
        let err = RepoSync::new(&git, &system)
            .probe_connectivity("  ")
            .unwrap_err();
        assert_eq!(err.message(), "Enter a Remote URL first.");
        assert!(git.calls().is_empty());
    }
}
