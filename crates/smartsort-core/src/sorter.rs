use crate::capture_date::CaptureDateReader;
use crate::classifier::{classify, Category};
use crate::error::Error;
use crate::operation::OperationContext;
use crate::placement::{place, PlaceMode};
use crate::scanner::{scan_files, FileEntry};
use chrono::Datelike;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    pub recursive: bool,
    pub mode: PlaceMode,
    /// Place photos under `Photos/<year>/<month>` when a capture date is known.
    pub group_photos_by_date: bool,
    /// Categories to sort into; anything else goes to `Others`. Empty means all.
    pub enabled_categories: Vec<Category>,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            mode: PlaceMode::Copy,
            group_photos_by_date: true,
            enabled_categories: Vec::new(),
        }
    }
}

impl SortOptions {
    pub fn is_enabled(&self, category: Category) -> bool {
        self.enabled_categories.is_empty() || self.enabled_categories.contains(&category)
    }
}

#[derive(Debug, Clone)]
pub struct PlacedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
}

#[derive(Debug, Clone, Default)]
pub struct SortSummary {
    pub placed: Vec<PlacedFile>,
    pub failed: usize,
}

/// Create one folder per category directly under `root`.
pub fn ensure_category_dirs(root: &Path) -> Result<(), Error> {
    for category in Category::ALL {
        let dir = root.join(category.as_str());
        fs::create_dir_all(&dir).map_err(|e| Error::scan(&dir, e))?;
    }
    Ok(())
}

/// Copy or move every file under `root` into its category folder.
pub fn sort_files(
    root: &Path,
    options: &SortOptions,
    ignore_patterns: &[String],
    capture_dates: Option<&dyn CaptureDateReader>,
    ctx: &OperationContext,
) -> Result<SortSummary, Error> {
    ctx.log(format!("Scanning {}...", root.display()));
    let files = scan_files(root, options.recursive, ignore_patterns, ctx.token())?;
    let mut summary = SortSummary::default();

    if ctx.is_cancelled() {
        ctx.log("Sorting cancelled.");
        ctx.progress.finish();
        return Ok(summary);
    }

    let total = files.len();
    if total == 0 {
        ctx.log("No files found to sort in this folder.");
        ctx.progress.finish();
        return Ok(summary);
    }

    ctx.log(format!("Found {} files. Processing...", total));
    ensure_category_dirs(root)?;

    let capture_dates = if options.group_photos_by_date {
        if capture_dates.is_none() {
            warn!("{}", Error::CapabilityUnavailable("Capture date reader"));
            ctx.log("Capture dates are not available; photos will not be grouped by date.");
        }
        capture_dates
    } else {
        None
    };

    for (index, file) in files.iter().enumerate() {
        if ctx.is_cancelled() {
            ctx.log("Sorting cancelled.");
            break;
        }

        let mut category = classify(&file.path);
        if !options.is_enabled(category) {
            category = Category::Others;
        }
        let target_dir = target_dir(root, category, file, capture_dates);

        match place(&file.path, &target_dir.join(file.name()), options.mode) {
            Ok(destination) => {
                let verb = match options.mode {
                    PlaceMode::Copy => "Copied",
                    PlaceMode::Move => "Moved",
                };
                ctx.log(format!("{}: {}", verb, file.file_name()));
                summary.placed.push(PlacedFile {
                    source: file.path.clone(),
                    destination,
                    category,
                });
            }
            Err(e) => {
                warn!("{}", e);
                ctx.log(format!("Error {}: {}", file.file_name(), e));
                summary.failed += 1;
            }
        }

        ctx.progress.advance(index + 1, total);
    }

    ctx.progress.finish();
    info!(
        "Sorted {} files under {} ({} failed)",
        summary.placed.len(),
        root.display(),
        summary.failed
    );
    if !ctx.is_cancelled() {
        ctx.log("Operation complete!");
    }
    Ok(summary)
}

fn target_dir(
    root: &Path,
    category: Category,
    file: &FileEntry,
    capture_dates: Option<&dyn CaptureDateReader>,
) -> PathBuf {
    let dir = root.join(category.as_str());
    if category != Category::Photos {
        return dir;
    }
    match capture_dates.and_then(|reader| reader.capture_date(&file.path)) {
        Some(taken) => dir
            .join(taken.year().to_string())
            .join(format!("{:02}", taken.month())),
        None => dir,
    }
}
