//! Colored terminal reporting
//!
//! Uses owo-colors for terminal colors and indicatif for download progress.
//! Everything except errors goes through the quiet switch.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

const TICK_INTERVAL_MS: u64 = 80;

const BYTES_TEMPLATE: &str = "     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})";

/// Suppress everything but errors.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print an action header (blue, bold)
/// Example: "==> Vendoring v1.3.4"
pub fn action(message: &str) {
    if !quiet() {
        println!("{} {}", "==>".blue().bold(), message.bold());
    }
}

/// Print a detail line (dimmed)
/// Example: "     downloading https://..."
pub fn detail(message: &str) {
    if !quiet() {
        println!("     {}", message.dimmed());
    }
}

/// Print a success message (green)
pub fn success(message: &str) {
    if !quiet() {
        println!("{} {}", "==>".green().bold(), message.green());
    }
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    if !quiet() {
        eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
    }
}

/// Print an error message (red). Never suppressed.
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Spinner for a download whose size is not known yet.
pub fn download_spinner(message: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Upgrade a spinner to a byte progress bar once content length is known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(BYTES_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_upgrade() {
        let pb = download_spinner("downloading test.zip");
        upgrade_to_bytes(&pb, 1024);
        pb.set_position(512);
        assert_eq!(pb.length(), Some(1024));
        pb.finish_and_clear();
    }
}
