//! Background execution of operations.
//!
//! Each started operation runs on its own thread. Progress and log lines are
//! sent back over a channel, so callers decide which thread handles them.
//! At most one operation may run per root directory.

use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::operation::{run_operation, Capabilities, Operation, TaskOutcome, TaskState};
use crate::progress::ProgressReporter;
use std::cell::Cell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Progress(f64),
    Log(String),
}

/// Forwards reporter calls into the event channel.
struct ChannelReporter {
    sender: Sender<TaskEvent>,
}

impl ProgressReporter for ChannelReporter {
    fn on_progress(&self, fraction: f64) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.sender.send(TaskEvent::Progress(fraction));
    }

    fn on_log(&self, line: &str) {
        let _ = self.sender.send(TaskEvent::Log(line.to_string()));
    }
}

type ActiveRoots = Arc<Mutex<HashSet<PathBuf>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a root's slot for as long as its worker thread lives.
struct SlotGuard {
    active: ActiveRoots,
    key: PathBuf,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.key);
        debug!("Released slot for {}", self.key.display());
    }
}

fn slot_key(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

/// Starts operations on background threads, one at a time per root.
#[derive(Clone, Default)]
pub struct TaskRunner {
    capabilities: Capabilities,
    ignore_patterns: Vec<String>,
    active: ActiveRoots,
}

impl TaskRunner {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn is_running(&self, root: &Path) -> bool {
        lock(&self.active).contains(&slot_key(root))
    }

    /// `Running` while an operation holds `root`, `Idle` otherwise.
    pub fn state(&self, root: &Path) -> TaskState {
        if self.is_running(root) {
            TaskState::Running
        } else {
            TaskState::Idle
        }
    }

    /// Start `operation` on `root`. Rejected with [`Error::AlreadyRunning`]
    /// while another operation holds the same root.
    pub fn start(
        &self,
        root: impl AsRef<Path>,
        operation: Operation,
        token: CancellationToken,
    ) -> Result<TaskHandle, Error> {
        let root = root.as_ref().to_path_buf();
        let key = slot_key(&root);
        if !lock(&self.active).insert(key.clone()) {
            return Err(Error::AlreadyRunning(root));
        }
        let guard = SlotGuard {
            active: Arc::clone(&self.active),
            key,
        };

        let (sender, events) = mpsc::channel();
        let state = Arc::new(Mutex::new(TaskState::Running));

        let worker_root = root.clone();
        let worker_state = Arc::clone(&state);
        let worker_token = token.clone();
        let capabilities = self.capabilities.clone();
        let ignore_patterns = self.ignore_patterns.clone();

        let thread = thread::Builder::new()
            .name(format!("smartsort-{}", operation.name()))
            .spawn(move || {
                let _guard = guard;
                let reporter = ChannelReporter { sender };
                let outcome = run_operation(
                    &worker_root,
                    &operation,
                    &capabilities,
                    &ignore_patterns,
                    &worker_token,
                    &reporter,
                );
                *lock(&worker_state) = outcome.state();
                outcome
            })
            .map_err(|e| Error::Other(format!("Failed to start worker thread: {}", e)))?;

        Ok(TaskHandle {
            root,
            token,
            events,
            state,
            thread,
            completion_seen: Cell::new(false),
        })
    }
}

/// A running operation.
pub struct TaskHandle {
    root: PathBuf,
    token: CancellationToken,
    events: Receiver<TaskEvent>,
    state: Arc<Mutex<TaskState>>,
    thread: JoinHandle<TaskOutcome>,
    /// Set once a `1.0` has been handed to the caller by any route.
    completion_seen: Cell<bool>,
}

impl TaskHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn state(&self) -> TaskState {
        *lock(&self.state)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocking event stream; ends once the operation has finished.
    pub fn events(&self) -> impl Iterator<Item = TaskEvent> + '_ {
        self.events.iter().inspect(|event| self.note(event))
    }

    fn note(&self, event: &TaskEvent) {
        if matches!(event, TaskEvent::Progress(fraction) if *fraction >= 1.0) {
            self.completion_seen.set(true);
        }
    }

    /// Deliver every event to the callbacks on the calling thread, in the
    /// order the work produced them, then return the outcome.
    pub fn drive<P, L>(self, mut on_progress: P, mut on_log: L) -> TaskOutcome
    where
        P: FnMut(f64),
        L: FnMut(&str),
    {
        for event in self.events() {
            match event {
                TaskEvent::Progress(fraction) => on_progress(fraction),
                TaskEvent::Log(line) => on_log(&line),
            }
        }

        let outcome = match self.thread.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Worker for {} panicked", self.root.display());
                *lock(&self.state) = TaskState::Failed;
                TaskOutcome::Failed(Error::Other(format!(
                    "Operation on {} panicked",
                    self.root.display()
                )))
            }
        };

        if !self.completion_seen.replace(true) {
            on_progress(1.0);
        }
        outcome
    }

    /// Block until the operation ends, discarding events.
    pub fn wait(self) -> TaskOutcome {
        self.drive(|_| {}, |_| {})
    }
}
