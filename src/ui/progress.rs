//! Spinner shown while a one-shot command waits on git

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner; it draws only when stderr is a terminal
#[must_use]
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
