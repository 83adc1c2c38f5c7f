use super::FileEntry;
use crate::cancel::CancellationToken;
use crate::config::CACHE_DIRNAME;
use crate::error::Error;
use glob::Pattern;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Sequential directory traversal in file-name order.
///
/// Lists regular files only (symlinks are not followed). With `recursive`
/// unset only direct children of `root` are returned. Paths matching one of
/// `ignore_globs` are skipped, and matching directories are not descended.
/// The reserved cache directory is never listed.
/// Stops early, returning what it has, once `token` is cancelled.
pub fn scan_files(
    root: &Path,
    recursive: bool,
    ignore_globs: &[String],
    token: &CancellationToken,
) -> Result<Vec<FileEntry>, Error> {
    // Surface an unreadable root as a setup failure rather than an empty scan
    fs::read_dir(root).map_err(|e| Error::scan(root, e))?;

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // The root itself is never subject to the ignore rules
            entry.depth() == 0
                || (entry.file_name() != CACHE_DIRNAME
                    && !ignore_patterns
                        .iter()
                        .any(|pattern| pattern.matches_path(entry.path())))
        });

    let mut files = Vec::new();
    for entry in walker {
        if token.is_cancelled() {
            debug!("Scan of {} cancelled after {} files", root.display(), files.len());
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Error getting metadata for {}: {}", entry.path().display(), err);
                continue;
            }
        };

        files.push(FileEntry {
            path: entry.into_path(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    debug!("Scanned {} files under {}", files.len(), root.display());
    Ok(files)
}
