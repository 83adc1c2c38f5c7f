use indicatif::{ProgressBar, ProgressStyle};
use smartsort_core::ProgressReporter;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const BAR_LENGTH: u64 = 1000;

/// Renders operation progress as a single indicatif bar. Log lines are
/// printed above the bar so they never tear it.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new(label: &str) -> Self {
        let pb = ProgressBar::new(BAR_LENGTH);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} {prefix} [{bar:30.cyan/dim}] {percent:>3}% ({elapsed})",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_prefix(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar: Mutex::new(Some(pb)),
        }
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressReporter for CliReporter {
    fn on_progress(&self, fraction: f64) {
        let mut guard = self.bar();
        if fraction >= 1.0 {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        } else if let Some(pb) = guard.as_ref() {
            pb.set_position((fraction * BAR_LENGTH as f64) as u64);
        }
    }

    fn on_log(&self, line: &str) {
        match self.bar().as_ref() {
            Some(pb) => pb.println(format!("  {}", line)),
            None => eprintln!("  {}", line),
        }
    }
}

impl Drop for CliReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.bar().take() {
            pb.finish_and_clear();
        }
    }
}
