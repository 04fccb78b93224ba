//! Path manipulation and validation utilities

use crate::error::SyncError;
use crate::system::System;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading '..' so escapes stay visible
                if components.is_empty()
                    || matches!(components.last(), Some(Component::ParentDir))
                {
                    components.push(component);
                } else {
                    components.pop();
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

/// Validate that a tracked path is relative to the repository and does not
/// escape it
///
/// # Errors
///
/// Returns `ConfigInvalid` if the path is empty, absolute, or climbs out of
/// the repository with `..`
pub fn validate_tracked_path(path: &str) -> Result<(), SyncError> {
    if path.trim().is_empty() {
        return Err(SyncError::config_invalid("Tracked path cannot be empty"));
    }

    let path_obj = Path::new(path);
    if path_obj.is_absolute() {
        return Err(SyncError::config_invalid(format!(
            "Tracked paths must be relative to the repository: '{path}'"
        )));
    }

    let normalized = normalize_path(path_obj);
    if normalized.as_os_str().is_empty() || normalized.starts_with("..") {
        return Err(SyncError::config_invalid(format!(
            "Tracked path escapes the repository: '{path}' -> '{}'",
            normalized.display()
        )));
    }

    Ok(())
}

/// Expand a leading `~` to the user's home directory
///
/// Paths without a leading `~` are returned unchanged. If no home directory
/// can be determined the path is also returned unchanged.
#[must_use]
pub fn expand_home(system: &dyn System, path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };

    if !rest.is_empty() && !rest.starts_with('/') && !rest.starts_with('\\') {
        // `~user` forms are left to the shell
        return PathBuf::from(path);
    }

    match system.home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

/// Convert backslashes to forward slashes, the separator git pathspecs use
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("./a/../b/./c")),
            PathBuf::from("b/c")
        );
        assert_eq!(normalize_path(Path::new("../a/b")), PathBuf::from("../a/b"));
        assert_eq!(normalize_path(Path::new("a/b/../..")), PathBuf::from(""));
        assert_eq!(normalize_path(Path::new("../../x")), PathBuf::from("../../x"));
    }

    #[test]
    fn test_validate_tracked_path() {
        assert!(validate_tracked_path("images/portfolio").is_ok());
        assert!(validate_tracked_path("a.txt").is_ok());
        assert!(validate_tracked_path("./docs/readme.md").is_ok());
        assert!(validate_tracked_path("a/../b").is_ok());

        assert!(validate_tracked_path("").is_err());
        assert!(validate_tracked_path("/etc/passwd").is_err());
        assert!(validate_tracked_path("../outside").is_err());
        assert!(validate_tracked_path("a/../..").is_err());
        assert!(validate_tracked_path(".").is_err());
    }

    #[test]
    fn test_expand_home() {
        let system = MockSystem::new().with_env("HOME", "/home/santina");
        assert_eq!(
            expand_home(&system, "~/photos/site"),
            PathBuf::from("/home/santina/photos/site")
        );
        assert_eq!(expand_home(&system, "~"), PathBuf::from("/home/santina"));
        assert_eq!(expand_home(&system, "/srv/site"), PathBuf::from("/srv/site"));
        assert_eq!(expand_home(&system, "~bob/x"), PathBuf::from("~bob/x"));
    }

    #[test]
    fn test_expand_home_without_home() {
        let system = MockSystem::new();
        assert_eq!(expand_home(&system, "~/x"), PathBuf::from("~/x"));
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("images\\portfolio"), "images/portfolio");
        assert_eq!(normalize_separators("images/portfolio"), "images/portfolio");
    }
}
