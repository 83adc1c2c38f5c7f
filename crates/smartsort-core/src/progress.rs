use std::cell::Cell;

/// Trait for reporting operation progress and status lines.
///
/// The CLI renders these with indicatif; the task runner forwards them over a
/// channel to whoever started the operation. Both methods default to no-ops.
/// Implementations must not assume they are called on any particular thread.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, _fraction: f64) {}
    fn on_log(&self, _line: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Per-operation progress state wrapped around a reporter.
///
/// Fractions are clamped to `[0, 1)` and only forwarded when they do not go
/// backwards. `1.0` is emitted by [`Progress::finish`], at most once.
pub struct Progress<'a> {
    reporter: &'a dyn ProgressReporter,
    last: Cell<f64>,
    finished: Cell<bool>,
}

impl<'a> Progress<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            reporter,
            last: Cell::new(0.0),
            finished: Cell::new(false),
        }
    }

    /// Report `done` out of `total` units of work.
    pub fn advance(&self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        self.set(done as f64 / total as f64);
    }

    pub fn set(&self, fraction: f64) {
        if self.finished.get() || !fraction.is_finite() {
            return;
        }
        // 1.0 is reserved for finish()
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction >= 1.0 || fraction < self.last.get() {
            return;
        }
        self.last.set(fraction);
        self.reporter.on_progress(fraction);
    }

    pub fn finish(&self) {
        if self.finished.replace(true) {
            return;
        }
        self.last.set(1.0);
        self.reporter.on_progress(1.0);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    pub fn log(&self, line: impl AsRef<str>) {
        self.reporter.on_log(line.as_ref());
    }
}
