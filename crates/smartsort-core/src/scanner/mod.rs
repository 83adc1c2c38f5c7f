mod walk;

pub use walk::scan_files;

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::SystemTime;

/// A file discovered during scanning. Snapshot taken at scan time; it goes
/// stale if the filesystem changes underneath a running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl FileEntry {
    /// Final path component, byte-for-byte. Use this to build destinations.
    pub fn name(&self) -> &OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }

    /// Lossy display form of [`FileEntry::name`] for log lines.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
