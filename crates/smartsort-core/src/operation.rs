use crate::cancel::CancellationToken;
use crate::capture_date::CaptureDateReader;
use crate::dupes::{self, DuplicateGroup, DuplicateOptions};
use crate::error::Error;
use crate::faces::{self, FaceAlbum, FaceOptions, FaceVectorExtractor};
use crate::progress::{Progress, ProgressReporter};
use crate::sorter::{self, SortOptions, SortSummary};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub enum Operation {
    Sort(SortOptions),
    FindDuplicates(DuplicateOptions),
    BuildFaceAlbums(FaceOptions),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Sort(_) => "sort",
            Operation::FindDuplicates(_) => "duplicates",
            Operation::BuildFaceAlbums(_) => "faces",
        }
    }
}

/// Terminal payload of an operation.
#[derive(Debug, Clone)]
pub enum OperationOutput {
    Sorted(SortSummary),
    Duplicates(Vec<DuplicateGroup>),
    FaceAlbums(Vec<FaceAlbum>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// How an operation ended. Cancellation is an early completion with partial
/// results, not an error; `Failed` means the operation could not get going.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(OperationOutput),
    Cancelled(OperationOutput),
    Failed(Error),
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Completed(_) => TaskState::Completed,
            TaskOutcome::Cancelled(_) => TaskState::Cancelled,
            TaskOutcome::Failed(_) => TaskState::Failed,
        }
    }

    pub fn output(&self) -> Option<&OperationOutput> {
        match self {
            TaskOutcome::Completed(output) | TaskOutcome::Cancelled(output) => Some(output),
            TaskOutcome::Failed(_) => None,
        }
    }
}

/// Optional collaborators. A missing capability degrades its feature to a
/// logged no-op.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub capture_dates: Option<Arc<dyn CaptureDateReader>>,
    pub face_vectors: Option<Arc<dyn FaceVectorExtractor>>,
}

impl Capabilities {
    pub fn with_capture_dates(mut self, reader: Arc<dyn CaptureDateReader>) -> Self {
        self.capture_dates = Some(reader);
        self
    }

    pub fn with_face_vectors(mut self, extractor: Arc<dyn FaceVectorExtractor>) -> Self {
        self.face_vectors = Some(extractor);
        self
    }
}

/// What an operation body sees: the cancellation token and its progress.
pub struct OperationContext<'a> {
    token: &'a CancellationToken,
    pub progress: Progress<'a>,
}

impl<'a> OperationContext<'a> {
    pub fn new(token: &'a CancellationToken, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            token,
            progress: Progress::new(reporter),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn log(&self, line: impl AsRef<str>) {
        debug!("{}", line.as_ref());
        self.progress.log(line);
    }
}

/// Run `operation` against `root` on the current thread.
///
/// Progress reaches 1.0 exactly once whatever the outcome.
pub fn run_operation(
    root: &Path,
    operation: &Operation,
    capabilities: &Capabilities,
    ignore_patterns: &[String],
    token: &CancellationToken,
    reporter: &dyn ProgressReporter,
) -> TaskOutcome {
    let ctx = OperationContext::new(token, reporter);
    info!("Starting {} on {}", operation.name(), root.display());

    let result = match operation {
        Operation::Sort(options) => sorter::sort_files(
            root,
            options,
            ignore_patterns,
            capabilities.capture_dates.as_deref(),
            &ctx,
        )
        .map(OperationOutput::Sorted),
        Operation::FindDuplicates(options) => {
            dupes::find_duplicates(root, options, ignore_patterns, &ctx)
                .map(OperationOutput::Duplicates)
        }
        Operation::BuildFaceAlbums(options) => faces::build_face_albums(
            root,
            options,
            ignore_patterns,
            capabilities.face_vectors.as_deref(),
            &ctx,
        )
        .map(OperationOutput::FaceAlbums),
    };

    let outcome = match result {
        Ok(output) if token.is_cancelled() => TaskOutcome::Cancelled(output),
        Ok(output) => TaskOutcome::Completed(output),
        Err(e) => {
            error!("{} on {} failed: {}", operation.name(), root.display(), e);
            ctx.log(format!("Scan failed: {}", e));
            TaskOutcome::Failed(e)
        }
    };
    ctx.progress.finish();
    info!("{} on {} ended: {:?}", operation.name(), root.display(), outcome.state());
    outcome
}
