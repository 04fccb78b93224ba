//! Configuration validation logic

use crate::config::Config;
use crate::error::SyncError;
use crate::system::System;
use crate::utils::path::validate_tracked_path;

/// Validate a complete configuration
///
/// Every tracked path must stay inside the repository. The list variant is
/// additionally required to point at an existing clone: an unusable list
/// configuration is fatal at startup, while an unconfigured sparse setup is
/// a normal state that the settings editor resolves.
///
/// # Errors
///
/// Returns `ConfigInvalid` if:
/// - A tracked path is empty, absolute or escapes the repository
/// - (list variant) `repo_path` is missing, does not exist, or is not a
///   repository
pub fn validate_config(system: &dyn System, config: &Config) -> Result<(), SyncError> {
    let tracked = config.tracked();

    for entry in tracked.entries() {
        validate_tracked_path(&entry.path)?;
    }

    if tracked.is_sparse() {
        return Ok(());
    }

    if tracked.entries().is_empty() {
        return Err(SyncError::config_invalid(
            "No files or folders are tracked; add entries to 'files' or 'folders'",
        ));
    }

    let Some(repo_dir) = config.repo_dir(system) else {
        return Err(SyncError::config_invalid("Missing required key 'repo_path'"));
    };

    if !system.is_dir(&repo_dir) {
        return Err(SyncError::config_invalid(format!(
            "Repository path does not exist: '{}'",
            repo_dir.display()
        )));
    }

    if !system.exists(&repo_dir.join(".git")) {
        return Err(SyncError::config_invalid(format!(
            "Not a git repository: '{}'",
            repo_dir.display()
        )));
    }

    Ok(())
}
