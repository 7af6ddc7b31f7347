//! Progress indicators for hoist.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use runbook::{ApplyResult, ProgressCallback};
use std::time::Duration;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with a success mark
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    println!("{} {}", "✓".green(), msg);
}

/// Finish a spinner with a failure mark
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}

fn counter(index: usize, total: usize) -> String {
    format!("[{}/{}]", index + 1, total)
}

fn outcome(result: &ApplyResult) -> &'static str {
    match result {
        ApplyResult::NoChange => "unchanged",
        ApplyResult::Created => "created",
        ApplyResult::Modified => "applied",
    }
}

/// Spinner per step: `[n/total] description`, replaced by a ✓ or ✗ line
pub struct StepProgress {
    quiet: bool,
    current: Option<(ProgressBar, String)>,
}

impl StepProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            current: None,
        }
    }
}

impl ProgressCallback for StepProgress {
    fn on_run_start(&mut self, total: usize) {
        log::info!("Running {total} steps");
    }

    fn on_step_start(&mut self, index: usize, total: usize, id: &str, description: &str) {
        log::info!("Starting step {} '{}'", index + 1, id);
        let line = format!("{} {}", counter(index, total).blue().bold(), description);
        let pb = if self.quiet {
            ProgressBar::hidden()
        } else {
            spinner(&line)
        };
        self.current = Some((pb, line));
    }

    fn on_step_complete(&mut self, index: usize, id: &str, result: &ApplyResult) {
        log::info!("Finished step {} '{}': {}", index + 1, id, outcome(result));
        if let Some((pb, line)) = self.current.take() {
            if self.quiet {
                pb.finish_and_clear();
            } else {
                finish_success(&pb, &format!("{} {}", line, outcome(result).dimmed()));
            }
        }
    }

    fn on_step_failed(&mut self, index: usize, id: &str, _error: &str) {
        log::info!("Step {} '{}' failed", index + 1, id);
        if let Some((pb, line)) = self.current.take() {
            finish_error(&pb, &line);
        }
    }
}
