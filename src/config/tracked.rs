//! The set of paths a repository syncs

use crate::utils::path::normalize_separators;
use serde::Serialize;

/// Folder synced when the settings file names no explicit files or folders
pub const DEFAULT_TRACKED_FOLDER: &str = "images/portfolio";

/// Whether a tracked path names a single file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Folder,
}

/// One tracked path, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedPath {
    pub path: String,
    pub kind: PathKind,
}

/// The paths staged, committed and pushed; nothing outside this set is
/// ever touched by a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedPaths {
    /// A single folder materialised through sparse checkout
    SparseFolder(String),
    /// An explicit list of files and folders
    Explicit {
        files: Vec<String>,
        folders: Vec<String>,
    },
}

impl Default for TrackedPaths {
    fn default() -> Self {
        Self::SparseFolder(DEFAULT_TRACKED_FOLDER.to_owned())
    }
}

impl TrackedPaths {
    /// Tracked entries in configuration order (files before folders),
    /// with duplicates removed
    #[must_use]
    pub fn entries(&self) -> Vec<TrackedPath> {
        let raw: Vec<(&String, PathKind)> = match self {
            Self::SparseFolder(folder) => vec![(folder, PathKind::Folder)],
            Self::Explicit { files, folders } => files
                .iter()
                .map(|f| (f, PathKind::File))
                .chain(folders.iter().map(|f| (f, PathKind::Folder)))
                .collect(),
        };

        let mut entries: Vec<TrackedPath> = Vec::with_capacity(raw.len());
        for (path, kind) in raw {
            let path = normalize_separators(path.trim());
            if path.is_empty() || entries.iter().any(|e| e.path == path) {
                continue;
            }
            entries.push(TrackedPath { path, kind });
        }
        entries
    }

    /// Pathspecs handed to git (`add --`, `status --`, `sparse-checkout set`)
    #[must_use]
    pub fn pathspecs(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.path).collect()
    }

    /// True for the single-folder sparse checkout set
    #[must_use]
    pub const fn is_sparse(&self) -> bool {
        matches!(self, Self::SparseFolder(_))
    }

    /// Human readable summary used in log lines, e.g. `a.txt, docs`
    #[must_use]
    pub fn describe(&self) -> String {
        self.pathspecs().join(", ")
    }
}
