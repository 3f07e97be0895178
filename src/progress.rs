//! Progress bar and logging utilities.
//!
//! In log-only mode bars are hidden and progress goes through `tracing`
//! instead, which keeps output tail-friendly.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Per-run progress settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub log_only: bool,
}

impl Progress {
    pub fn new(log_only: bool) -> Self {
        Self { log_only }
    }

    /// Hidden progress, for tests and non-interactive callers.
    pub fn hidden() -> Self {
        Self { log_only: true }
    }

    /// Create a progress bar with consistent styling.
    pub fn bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if self.log_only {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        } else if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(msg.to_string());
        pb
    }

    /// Log progress at `interval` steps, only in log-only mode.
    pub fn log(&self, phase: &str, current: u64, total: u64, interval: u64) {
        if self.log_only && should_log(current, total, interval) {
            let pct = if total == 0 {
                100.0
            } else {
                100.0 * current as f64 / total as f64
            };
            tracing::info!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
        }
    }
}

fn should_log(current: u64, total: u64, interval: u64) -> bool {
    current == total || (interval > 0 && current % interval == 0)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
