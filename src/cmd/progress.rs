//! Spinners shown while waiting on Resource Manager
//!
//! Spinners draw to stderr and hide themselves when it is not a terminal, so
//! piped output stays clean.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for an enumeration whose length is unknown up front
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub fn finish_spinner_success(spinner: &ProgressBar, message: &str) {
    finish_with_prefix(spinner, "{prefix:.green} {msg}", "✓", message);
}

pub fn finish_spinner_error(spinner: &ProgressBar, message: &str) {
    finish_with_prefix(spinner, "{prefix:.red} {msg}", "✗", message);
}

fn finish_with_prefix(spinner: &ProgressBar, template: &str, prefix: &'static str, message: &str) {
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_prefix(prefix);
    spinner.finish_with_message(message.to_string());
}
