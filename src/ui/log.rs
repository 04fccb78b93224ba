//! Append-only, timestamped activity log shown to the user

use chrono::{DateTime, Local};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Step,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]  {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Entries are only ever appended
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message stamped with the current local time
    pub fn append(&mut self, level: LogLevel, message: impl Into<String>) -> &LogEntry {
        self.append_at(Local::now(), level, message)
    }

    /// Append a message with an explicit timestamp
    pub fn append_at(
        &mut self,
        at: DateTime<Local>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> &LogEntry {
        self.entries.push(LogEntry {
            at,
            level,
            message: message.into(),
        });
        &self.entries[self.entries.len() - 1]
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Most recent entry, if any
    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}
