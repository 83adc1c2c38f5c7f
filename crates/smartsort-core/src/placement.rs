//! Collision-free file placement.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceMode {
    #[default]
    Copy,
    Move,
}

/// Return `target_dir/file_name`, or the first `stem (n).ext` variant that
/// does not exist yet.
///
/// Check-then-use: a concurrent writer can still claim the path before the
/// caller does.
pub fn resolve_destination(target_dir: &Path, file_name: &Path) -> PathBuf {
    let candidate = target_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| OsString::from("file"));
    let extension = file_name.extension();
    let mut index = 1;

    loop {
        let mut name = stem.clone();
        name.push(format!(" ({})", index));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        let candidate = target_dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

/// Copy or move `src` to `dst`, creating parent directories and resolving
/// name collisions first. Returns the path actually written.
pub fn place(src: &Path, dst: &Path, mode: PlaceMode) -> Result<PathBuf, Error> {
    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let file_name = dst.file_name().ok_or_else(|| {
        Error::io(
            dst,
            io::Error::new(io::ErrorKind::InvalidInput, "missing file name"),
        )
    })?;
    let final_path = resolve_destination(parent, Path::new(file_name));

    match mode {
        PlaceMode::Copy => copy_preserving(src, &final_path),
        PlaceMode::Move => move_file(src, &final_path),
    }
    .map_err(|e| Error::io(src, e))?;

    trace!("{:?} {} -> {}", mode, src.display(), final_path.display());
    Ok(final_path)
}

fn copy_preserving(src: &Path, dst: &Path) -> io::Result<()> {
    // fs::copy carries permissions; timestamps are restored separately
    fs::copy(src, dst)?;
    let metadata = fs::metadata(src)?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    File::options().write(true).open(dst)?.set_times(times)
}

fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !src.exists() {
                return Err(rename_err);
            }
            // Different filesystem: fall back to copy + delete
            debug!(
                "rename {} failed ({}), copying instead",
                src.display(),
                rename_err
            );
            copy_preserving(src, dst)?;
            fs::remove_file(src)
        }
    }
}
