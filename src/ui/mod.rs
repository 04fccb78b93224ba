//! Terminal front-end
//!
//! Presentation only: the activity log, status rendering, progress spinner
//! and the interactive loop that owns a `Session`.

pub mod interactive;
pub mod log;
pub mod progress;
pub mod render;

pub use log::{ActivityLog, LogEntry, LogLevel};
pub use render::{Indicator, subtitle};
