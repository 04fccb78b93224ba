//! Per-path status of the tracked set

use crate::config::{PathKind, TrackedPath, TrackedPaths};
use crate::git::GitInvocation;
use crate::git::porcelain::{changed_count, describe_file_change};
use crate::operations::RepoSync;
use core::fmt;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Advisory classification of one tracked path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ok,
    Changed,
    Missing,
    Error,
}

/// Status of one tracked path, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStatus {
    pub path: String,
    pub path_kind: PathKind,
    pub kind: StatusKind,
    pub label: String,
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — {}", self.path, self.label)
    }
}

impl PathStatus {
    fn new(entry: &TrackedPath, kind: StatusKind, label: impl Into<String>) -> Self {
        Self {
            path: entry.path.clone(),
            path_kind: entry.kind,
            kind,
            label: label.into(),
        }
    }
}

impl RepoSync<'_> {
    /// Classify every tracked path
    ///
    /// A path absent on disk is `missing` without asking git. Otherwise a
    /// scoped porcelain status decides between `ok`, `changed` and `error`.
    #[must_use]
    pub fn status(&self, repo_dir: &Path, tracked: &TrackedPaths) -> Vec<PathStatus> {
        tracked
            .entries()
            .iter()
            .map(|entry| self.path_status(repo_dir, entry))
            .collect()
    }

    fn path_status(&self, repo_dir: &Path, entry: &TrackedPath) -> PathStatus {
        if !self.system.exists(&repo_dir.join(&entry.path)) {
            return PathStatus::new(entry, StatusKind::Missing, "missing");
        }

        let invocation = GitInvocation::in_repo(
            repo_dir,
            ["status", "--porcelain", "--", entry.path.as_str()],
        );
        let output = match self.runner.run(&invocation) {
            Ok(output) if output.ok => output,
            Ok(output) => {
                warn!("status of {} failed: {}", entry.path, output.stderr);
                return PathStatus::new(entry, StatusKind::Error, "unknown");
            }
            Err(e) => {
                warn!("status of {} failed: {e}", entry.path);
                return PathStatus::new(entry, StatusKind::Error, "unknown");
            }
        };

        if output.stdout.is_empty() {
            return PathStatus::new(entry, StatusKind::Ok, "up to date");
        }

        debug!("{} has changes:\n{}", entry.path, output.stdout);
        let label = match entry.kind {
            PathKind::File => describe_file_change(&output.stdout).to_owned(),
            PathKind::Folder => format!(
                "{} file(s) changed — ready to push",
                changed_count(&output.stdout)
            ),
        };
        PathStatus::new(entry, StatusKind::Changed, label)
    }

    /// Whether any tracked path has something to commit
    ///
    /// Only a successful, empty status answers `false`; a failed query lets
    /// the push go ahead and report the real error.
    #[must_use]
    pub fn has_pending_changes(&self, repo_dir: &Path, tracked: &TrackedPaths) -> bool {
        let args = ["status".to_owned(), "--porcelain".to_owned(), "--".to_owned()]
            .into_iter()
            .chain(tracked.pathspecs());
        match self.runner.run(&GitInvocation::in_repo(repo_dir, args)) {
            Ok(output) if output.ok => !output.stdout.is_empty(),
            Ok(_) | Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{MockGit, ToolOutput};
    use crate::system::MockSystem;

    fn files(names: &[&str]) -> TrackedPaths {
        TrackedPaths::Explicit {
            files: names.iter().map(|s| (*s).to_owned()).collect(),
            folders: vec![],
        }
    }

    #[test]
    fn test_modified_file() {
        let git = MockGit::new().on(&["status"], ToolOutput::success("M  a.txt"));
        let system = MockSystem::new().with_file("/r/a.txt", b"x");
        let statuses = RepoSync::new(&git, &system).status(Path::new("/r"), &files(&["a.txt"]));

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].kind, StatusKind::Changed);
        assert_eq!(statuses[0].label, "modified");
        assert_eq!(statuses[0].to_string(), "a.txt — modified");
        assert_eq!(git.call_args()[0], vec!["status", "--porcelain", "--", "a.txt"]);
    }

    #[test]
    fn test_untracked_file() {
        let git = MockGit::new().on(&["status"], ToolOutput::success("?? a.txt"));
        let system = MockSystem::new().with_file("/r/a.txt", b"x");
        let statuses = RepoSync::new(&git, &system).status(Path::new("/r"), &files(&["a.txt"]));
        assert_eq!(statuses[0].kind, StatusKind::Changed);
        assert_eq!(statuses[0].label, "untracked");
    }

    #[test]
    fn test_clean_file() {
        let git = MockGit::new().on(&["status"], ToolOutput::success(""));
        let system = MockSystem::new().with_file("/r/a.txt", b"x");
        let statuses = RepoSync::new(&git, &system).status(Path::new("/r"), &files(&["a.txt"]));
        assert_eq!(statuses[0].kind, StatusKind::Ok);
        assert_eq!(statuses[0].label, "up to date");
    }

    #[test]
    fn test_missing_regardless_of_output() {
        let git = MockGit::new().on(&["status"], ToolOutput::success(" D a.txt"));
        let system = MockSystem::new().with_dir("/r");
        let statuses = RepoSync::new(&git, &system).status(Path::new("/r"), &files(&["a.txt"]));
        assert_eq!(statuses[0].kind, StatusKind::Missing);
        assert_eq!(statuses[0].label, "missing");
    }

    #[test]
    fn test_query_failure_is_error() {
        let git = MockGit::new().on(&["status"], ToolOutput::failure("fatal: not a git repository"));
        let system = MockSystem::new().with_file("/r/a.txt", b"x");
        let statuses = RepoSync::new(&git, &system).status(Path::new("/r"), &files(&["a.txt"]));
        assert_eq!(statuses[0].kind, StatusKind::Error);

        let git = MockGit::new().on_timeout(&["status"]);
        let statuses = RepoSync::new(&git, &system).status(Path::new("/r"), &files(&["a.txt"]));
        assert_eq!(statuses[0].kind, StatusKind::Error);
    }

    #[test]
    fn test_folder_reports_count() {
        let git = MockGit::new().on(
            &["status"],
            ToolOutput::success("M images/portfolio/a.jpg\n?? images/portfolio/b.jpg"),
        );
        let system = MockSystem::new().with_dir("/r/images/portfolio");
        let statuses =
            RepoSync::new(&git, &system).status(Path::new("/r"), &TrackedPaths::default());
        assert_eq!(statuses[0].kind, StatusKind::Changed);
        assert_eq!(statuses[0].label, "2 file(s) changed — ready to push");
    }

    #[test]
    fn test_pending_changes() {
        let system = MockSystem::new();
        let repo = Path::new("/r");

        let git = MockGit::new().on(&["status"], ToolOutput::success(""));
        assert!(!RepoSync::new(&git, &system).has_pending_changes(repo, &files(&["a.txt", "b.txt"])));
        assert_eq!(
            git.call_args()[0],
            vec!["status", "--porcelain", "--", "a.txt", "b.txt"]
        );

        let git = MockGit::new().on(&["status"], ToolOutput::success("M a.txt"));
        assert!(RepoSync::new(&git, &system).has_pending_changes(repo, &files(&["a.txt"])));

        let git = MockGit::new().on(&["status"], ToolOutput::failure("boom"));
        assert!(RepoSync::new(&git, &system).has_pending_changes(repo, &files(&["a.txt"])));
    }
}
