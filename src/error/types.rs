//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for tracksync operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// The configuration file (or a required value in it) is absent
    #[error("Configuration missing: {message}")]
    ConfigMissing { message: String },

    /// Configuration is present but unusable: missing required key,
    /// path does not exist, path is not a repository
    #[error("Configuration error: {message}")]
    ConfigInvalid { message: String },

    /// An external git invocation exceeded its timeout
    #[error("{message}")]
    ToolTimeout { message: String },

    /// An external git invocation failed (non-zero exit or could not start).
    /// The message is surfaced to the user verbatim.
    #[error("{message}")]
    ToolExecution { message: String },

    /// Filesystem Error - settings file could not be read or written
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl SyncError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::ConfigMissing { .. } => 1,
            Self::ConfigInvalid { .. } => 2,
            Self::ToolTimeout { .. } => 3,
            Self::ToolExecution { .. } => 4,
            Self::Filesystem { .. } => 5,
        }
    }

    /// Create a missing-configuration error
    #[inline]
    pub fn config_missing<S: Into<String>>(message: S) -> Self {
        Self::ConfigMissing {
            message: message.into(),
        }
    }

    /// Create an invalid-configuration error
    #[inline]
    pub fn config_invalid<S: Into<String>>(message: S) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[inline]
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::ToolTimeout {
            message: message.into(),
        }
    }

    /// Create a tool execution error
    #[inline]
    pub fn tool<S: Into<String>>(message: S) -> Self {
        Self::ToolExecution {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    /// Prefix a tool failure with the label of the step that produced it,
    /// e.g. `sparse-checkout init failed: <stderr>`.
    ///
    /// Configuration and filesystem errors are returned unchanged.
    #[must_use]
    pub fn in_step(self, step: &str) -> Self {
        match self {
            Self::ToolTimeout { message } => Self::ToolTimeout {
                message: format!("{step}: {message}"),
            },
            Self::ToolExecution { message } => Self::ToolExecution {
                message: format!("{step}: {message}"),
            },
            other => other,
        }
    }

    /// The bare message without the category prefix
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigMissing { message }
            | Self::ConfigInvalid { message }
            | Self::ToolTimeout { message }
            | Self::ToolExecution { message }
            | Self::Filesystem { message } => message,
        }
    }
}

/// Result alias for controller operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            SyncError::config_missing("x").exit_code(),
            SyncError::config_invalid("x").exit_code(),
            SyncError::timeout("x").exit_code(),
            SyncError::tool("x").exit_code(),
            SyncError::filesystem("x").exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_tool_error_displays_verbatim() {
        let err = SyncError::tool("rejected — non-fast-forward");
        assert_eq!(err.to_string(), "rejected — non-fast-forward");
    }

    #[test]
    fn test_in_step_prefixes_tool_failures_only() {
        let err = SyncError::tool("bad pattern").in_step("sparse-checkout set failed");
        assert_eq!(err.to_string(), "sparse-checkout set failed: bad pattern");

        let err = SyncError::timeout("Command timed out").in_step("checkout failed");
        assert_eq!(err.message(), "checkout failed: Command timed out");

        let err = SyncError::config_invalid("no repo").in_step("checkout failed");
        assert_eq!(err.message(), "no repo");
    }
}
