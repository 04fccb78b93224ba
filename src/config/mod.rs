//! Settings store
//!
//! Handles the flat JSON settings file: loading with defaults, schema
//! validation, startup validation and pretty-printed saving

pub mod schema;
pub mod settings;
pub mod tracked;
pub mod validation;

pub use tracked::{DEFAULT_TRACKED_FOLDER, PathKind, TrackedPath, TrackedPaths};

use crate::error::SyncError;
use crate::system::System;
use crate::utils::path::expand_home;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Branch used when the settings file does not name one
pub const DEFAULT_BRANCH: &str = "main";

/// Commit message prefix used when the settings file does not name one
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update tracked files via tracksync";

/// Settings file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Main configuration structure
///
/// Unknown keys are carried in `extra` so that saving never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote the repository is cloned from and pushed to
    #[serde(default)]
    pub remote_url: String,

    /// Local clone location; may start with `~`
    #[serde(default)]
    pub repo_path: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Prefix of the generated commit message
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Explicitly tracked files (list variant only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// Explicitly tracked folders (list variant only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_branch() -> String {
    return DEFAULT_BRANCH.to_owned();
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            repo_path: String::new(),
            branch: default_branch(),
            commit_message: default_commit_message(),
            files: None,
            folders: None,
            extra: Map::new(),
        }
    }
}

/// Changes made from the settings editor; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub remote_url: Option<String>,
    pub repo_path: Option<String>,
    pub branch: Option<String>,
    pub commit_message: Option<String>,
    pub files: Option<Vec<String>>,
    pub folders: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from file, filling defaults for missing keys
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_from_file(system: &dyn System, path: &Path) -> anyhow::Result<Self> {
        settings::load_config(system, path)
    }

    /// Save configuration as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, system: &dyn System, path: &Path) -> anyhow::Result<()> {
        settings::save_config(system, self, path)
    }

    /// Validate the configuration before any git work starts
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if a tracked path is unsafe or, for the list
    /// variant, if the repository is not usable
    pub fn validate(&self, system: &dyn System) -> Result<(), SyncError> {
        validation::validate_config(system, self)
    }

    /// The tracked-path set this configuration describes
    #[must_use]
    pub fn tracked(&self) -> TrackedPaths {
        if self.files.is_none() && self.folders.is_none() {
            return TrackedPaths::default();
        }
        TrackedPaths::Explicit {
            files: self.files.clone().unwrap_or_default(),
            folders: self.folders.clone().unwrap_or_default(),
        }
    }

    /// True once there is enough to work with: the sparse folder needs the
    /// remote and the local path, an explicit list only its existing clone
    #[must_use]
    pub fn is_configured(&self) -> bool {
        if self.repo_path.trim().is_empty() {
            return false;
        }
        !self.tracked().is_sparse() || !self.remote_url.trim().is_empty()
    }

    /// Resolved local clone directory, or `None` when unset
    #[must_use]
    pub fn repo_dir(&self, system: &dyn System) -> Option<PathBuf> {
        let raw = self.repo_path.trim();
        if raw.is_empty() {
            return None;
        }
        Some(expand_home(system, raw))
    }

    /// Branch name, falling back to the default for blank values
    #[must_use]
    pub fn branch(&self) -> &str {
        let branch = self.branch.trim();
        if branch.is_empty() { DEFAULT_BRANCH } else { branch }
    }

    /// Commit message pre-filled for a push at the given moment
    #[must_use]
    pub fn commit_message_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: core::fmt::Display,
    {
        let prefix = self.commit_message.trim();
        let prefix = if prefix.is_empty() {
            DEFAULT_COMMIT_MESSAGE
        } else {
            prefix
        };
        format!("{prefix} — {}", at.format("%Y-%m-%d %H:%M"))
    }

    /// Commit message pre-filled for a push right now
    #[must_use]
    pub fn default_commit_message(&self) -> String {
        self.commit_message_at(&Local::now())
    }

    /// Apply edits from the settings editor, trimming every value
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(remote_url) = update.remote_url {
            self.remote_url = remote_url.trim().to_owned();
        }
        if let Some(repo_path) = update.repo_path {
            self.repo_path = repo_path.trim().to_owned();
        }
        if let Some(branch) = update.branch {
            self.branch = branch.trim().to_owned();
        }
        if let Some(commit_message) = update.commit_message {
            self.commit_message = commit_message.trim().to_owned();
        }
        let list_edit = update.files.is_some() || update.folders.is_some();
        if let Some(files) = update.files {
            self.files = Some(trim_all(files));
        }
        if let Some(folders) = update.folders {
            self.folders = Some(trim_all(folders));
        }
        if list_edit {
            self.files.get_or_insert_with(Vec::new);
            self.folders.get_or_insert_with(Vec::new);
        }
    }
}

fn trim_all(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}
