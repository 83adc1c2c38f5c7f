//! Smart folder organisation.
//!
//! Sorts a directory's files into category folders, finds exact duplicate
//! files, and groups photos into per-person albums. Every operation reports
//! fractional progress and log lines through a [`ProgressReporter`] and stops
//! early when its [`CancellationToken`] is set. [`TaskRunner`] runs operations
//! on background threads, one per root directory.

pub mod cancel;
pub mod capture_date;
pub mod classifier;
pub mod config;
pub mod dupes;
pub mod error;
pub mod faces;
pub mod hasher;
pub mod operation;
pub mod placement;
pub mod progress;
pub mod runner;
pub mod scanner;
pub mod sorter;

pub use cancel::CancellationToken;
pub use capture_date::{CaptureDateReader, ExifCaptureDateReader};
pub use classifier::{classify, Category};
pub use config::{load_configuration, AppConfig};
pub use dupes::{DuplicateGroup, DuplicateOptions, MatchKind};
pub use error::Error;
pub use faces::{FaceAlbum, FaceOptions, FaceVectorExtractor, FeatureVector};
pub use operation::{
    run_operation, Capabilities, Operation, OperationContext, OperationOutput, TaskOutcome,
    TaskState,
};
pub use placement::PlaceMode;
pub use progress::{ProgressReporter, SilentReporter};
pub use runner::{TaskEvent, TaskHandle, TaskRunner};
pub use scanner::FileEntry;
pub use sorter::{SortOptions, SortSummary};
