//! Text rendering of repository and status information

use crate::config::Config;
use crate::operations::{PathStatus, StatusKind};
use crate::system::System;
use core::fmt;

/// Overall status shown next to the subtitle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Idle,
    Busy,
    Ok,
    Error,
}

impl Indicator {
    /// Worst status across the tracked paths: any missing or errored path
    /// is an error, any change leaves work pending
    #[must_use]
    pub fn from_statuses(statuses: &[PathStatus]) -> Self {
        if statuses
            .iter()
            .any(|s| matches!(s.kind, StatusKind::Missing | StatusKind::Error))
        {
            Self::Error
        } else if statuses.iter().any(|s| s.kind == StatusKind::Changed) {
            Self::Busy
        } else {
            Self::Ok
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Busy => "busy",
            Self::Ok => "ok",
            Self::Error => "error",
        };
        write!(f, "● {label}")
    }
}

/// `Repo: <folder name>   •   Branch: <branch>`
#[must_use]
pub fn subtitle(config: &Config, system: &dyn System) -> String {
    let repo_name = config
        .repo_dir(system)
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "—".to_owned());
    format!("Repo: {repo_name}   •   Branch: {}", config.branch())
}

/// One indented line per tracked path
#[must_use]
pub fn status_lines(statuses: &[PathStatus]) -> Vec<String> {
    statuses.iter().map(|s| format!("  {s}")).collect()
}
