//! Exact duplicate detection.
//!
//! Two-phase reduction: files are bucketed by byte size, and only buckets
//! with at least two members are hashed. Files of different sizes are never
//! compared.

use crate::classifier::{classify, Category};
use crate::error::Error;
use crate::hasher::{Blake3Hasher, ContentHasher};
use crate::operation::OperationContext;
use crate::scanner::{scan_files, FileEntry};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuplicateOptions {
    pub recursive: bool,
    /// Restrict the scan to the Photos category.
    pub images_only: bool,
    /// Accepted for near-duplicate image matching, which is not implemented.
    /// Only exact duplicates are reported regardless of this flag.
    pub perceptual: bool,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            images_only: true,
            perceptual: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
}

/// Files with identical content. `keep` is the most recently modified
/// member; everything in `delete` is a candidate only and is never removed
/// here.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub digest: String,
    pub size: u64,
    pub keep: FileEntry,
    pub delete: Vec<FileEntry>,
    pub reason: MatchKind,
}

impl DuplicateGroup {
    /// Build a group from at least two members sharing `digest`.
    fn from_members(digest: String, size: u64, mut members: Vec<FileEntry>) -> Self {
        // Ties keep the first member encountered
        let mut keep_index = 0;
        for (index, member) in members.iter().enumerate().skip(1) {
            if member.modified > members[keep_index].modified {
                keep_index = index;
            }
        }
        let keep = members.remove(keep_index);
        Self {
            digest,
            size,
            keep,
            delete: members,
            reason: MatchKind::Exact,
        }
    }

    pub fn len(&self) -> usize {
        self.delete.len() + 1
    }

    pub fn members(&self) -> impl Iterator<Item = &FileEntry> {
        std::iter::once(&self.keep).chain(self.delete.iter())
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.delete.len() as u64
    }
}

/// Scan `root` and report exact duplicates using BLAKE3 digests.
pub fn find_duplicates(
    root: &Path,
    options: &DuplicateOptions,
    ignore_patterns: &[String],
    ctx: &OperationContext,
) -> Result<Vec<DuplicateGroup>, Error> {
    find_duplicates_with(root, options, ignore_patterns, &Blake3Hasher, ctx)
}

pub fn find_duplicates_with(
    root: &Path,
    options: &DuplicateOptions,
    ignore_patterns: &[String],
    hasher: &dyn ContentHasher,
    ctx: &OperationContext,
) -> Result<Vec<DuplicateGroup>, Error> {
    ctx.log("Listing files...");
    let mut files = scan_files(root, options.recursive, ignore_patterns, ctx.token())?;
    if ctx.is_cancelled() {
        ctx.log("Duplicate scan cancelled.");
        ctx.progress.finish();
        return Ok(Vec::new());
    }

    if options.images_only {
        files.retain(|file| classify(&file.path) == Category::Photos);
    }

    if files.is_empty() {
        ctx.log("No files to scan.");
        ctx.progress.finish();
        return Ok(Vec::new());
    }

    if options.perceptual {
        ctx.log("Perceptual matching is not available; reporting exact duplicates only.");
    }

    ctx.log(format!("Scanning {} files for duplicates...", files.len()));
    let groups = group_duplicates(files, hasher, ctx);
    if ctx.is_cancelled() {
        ctx.log("Duplicate scan cancelled.");
    }

    ctx.progress.finish();
    info!("{} duplicate groups under {}", groups.len(), root.display());
    ctx.log(format!("Found {} duplicate groups.", groups.len()));
    Ok(groups)
}

/// Bucket `files` by size, then hash each bucket of two or more.
///
/// Progress advances once per size bucket, including singleton buckets that
/// are skipped without hashing. Cancellation is checked before each bucket.
pub fn group_duplicates(
    files: Vec<FileEntry>,
    hasher: &dyn ContentHasher,
    ctx: &OperationContext,
) -> Vec<DuplicateGroup> {
    let mut size_to_files: BTreeMap<u64, Vec<FileEntry>> = BTreeMap::new();
    for file in files {
        size_to_files.entry(file.size).or_default().push(file);
    }

    let total_buckets = size_to_files.len();
    debug!("{} distinct sizes", total_buckets);

    let mut duplicates = Vec::new();
    for (index, (size, bucket)) in size_to_files.into_iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        if bucket.len() > 1 {
            duplicates.extend(hash_bucket(size, bucket, hasher, ctx));
        }
        ctx.progress.advance(index + 1, total_buckets);
    }
    duplicates
}

fn hash_bucket(
    size: u64,
    bucket: Vec<FileEntry>,
    hasher: &dyn ContentHasher,
    ctx: &OperationContext,
) -> Vec<DuplicateGroup> {
    let mut digest_order: Vec<String> = Vec::new();
    let mut by_digest: HashMap<String, Vec<FileEntry>> = HashMap::new();

    for file in bucket {
        match hasher.content_hash(&file.path) {
            Ok(digest) => {
                let members = by_digest.entry(digest.clone()).or_insert_with(|| {
                    digest_order.push(digest);
                    Vec::new()
                });
                members.push(file);
            }
            Err(e) => {
                warn!("Error hashing '{}': {}", file.path.display(), e);
                ctx.log(format!("Error {}: {}", file.file_name(), e));
            }
        }
    }

    digest_order
        .into_iter()
        .filter_map(|digest| {
            let members = by_digest.remove(&digest)?;
            (members.len() > 1).then(|| DuplicateGroup::from_members(digest, size, members))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::progress::SilentReporter;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::io;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    /// Hashes the path name's first character and remembers what it saw.
    #[derive(Default)]
    struct CountingHasher {
        calls: RefCell<Vec<PathBuf>>,
        failing: HashSet<PathBuf>,
    }

    impl ContentHasher for CountingHasher {
        fn content_hash(&self, path: &Path) -> io::Result<String> {
            self.calls.borrow_mut().push(path.to_path_buf());
            if self.failing.contains(path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            let name = path.file_name().unwrap().to_string_lossy();
            Ok(name[..1].to_string())
        }
    }

    fn entry(name: &str, size: u64, modified_secs: u64) -> FileEntry {
        FileEntry {
            path: PathBuf::from("/data").join(name),
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(modified_secs),
        }
    }

    #[test]
    fn test_singleton_buckets_are_never_hashed() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let hasher = CountingHasher::default();
        let files = vec![entry("a1", 10, 1), entry("a2", 20, 1), entry("a3", 30, 1)];

        let groups = group_duplicates(files, &hasher, &ctx);

        assert!(groups.is_empty());
        assert!(hasher.calls.borrow().is_empty());
    }

    #[derive(Default)]
    struct FractionLog(std::sync::Mutex<Vec<f64>>);

    impl crate::progress::ProgressReporter for FractionLog {
        fn on_progress(&self, fraction: f64) {
            self.0.lock().unwrap().push(fraction);
        }
    }

    #[test]
    fn test_singleton_buckets_still_advance_progress() {
        let token = CancellationToken::new();
        let fractions = FractionLog::default();
        let ctx = OperationContext::new(&token, &fractions);
        let hasher = CountingHasher::default();
        let files = vec![
            entry("a1", 10, 1),
            entry("a2", 20, 1),
            entry("a3", 30, 1),
            entry("a4", 40, 1),
        ];

        group_duplicates(files, &hasher, &ctx);

        // The last bucket's 1.0 is left to finish()
        assert_eq!(*fractions.0.lock().unwrap(), vec![0.25, 0.5, 0.75]);
        assert!(hasher.calls.borrow().is_empty());
    }

    #[test]
    fn test_distinct_sizes_never_compared() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let hasher = CountingHasher::default();
        // Same fake digest ("a") everywhere, but only the 10-byte pair may group
        let files = vec![
            entry("a1", 10, 1),
            entry("a2", 10, 2),
            entry("a3", 99, 3),
        ];

        let groups = group_duplicates(files, &hasher, &ctx);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].size, 10);
        assert_eq!(hasher.calls.borrow().len(), 2);
        assert!(!hasher.calls.borrow().contains(&PathBuf::from("/data/a3")));
    }

    #[test]
    fn test_keep_is_most_recently_modified() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let hasher = CountingHasher::default();
        let files = vec![
            entry("x1", 5, 100),
            entry("x2", 5, 300),
            entry("x3", 5, 200),
        ];

        let groups = group_duplicates(files, &hasher, &ctx);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keep.path, PathBuf::from("/data/x2"));
        assert_eq!(groups[0].delete.len(), 2);
        assert_eq!(groups[0].wasted_bytes(), 10);
        assert_eq!(groups[0].reason, MatchKind::Exact);
    }

    #[test]
    fn test_modification_time_tie_keeps_first() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let hasher = CountingHasher::default();
        let files = vec![entry("t1", 5, 100), entry("t2", 5, 100)];

        let groups = group_duplicates(files, &hasher, &ctx);
        assert_eq!(groups[0].keep.path, PathBuf::from("/data/t1"));
    }

    #[test]
    fn test_same_size_different_digest_splits() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let hasher = CountingHasher::default();
        let files = vec![
            entry("a1", 5, 1),
            entry("b1", 5, 1),
            entry("a2", 5, 1),
            entry("c1", 5, 1),
        ];

        let groups = group_duplicates(files, &hasher, &ctx);
        assert_eq!(groups.len(), 1);
        let members: Vec<_> = groups[0].members().map(|f| f.file_name()).collect();
        assert_eq!(members, vec!["a1", "a2"]);
    }

    #[test]
    fn test_hash_failure_skips_file_only() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let mut hasher = CountingHasher::default();
        hasher.failing.insert(PathBuf::from("/data/a2"));
        let files = vec![entry("a1", 5, 1), entry("a2", 5, 2), entry("a3", 5, 3)];

        let groups = group_duplicates(files, &hasher, &ctx);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert!(groups[0].members().all(|f| f.file_name() != "a2"));
    }

    #[test]
    fn test_cancelled_before_first_bucket_hashes_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = OperationContext::new(&token, &SilentReporter);
        let hasher = CountingHasher::default();
        let files = vec![entry("a1", 5, 1), entry("a2", 5, 2)];

        let groups = group_duplicates(files, &hasher, &ctx);
        assert!(groups.is_empty());
        assert!(hasher.calls.borrow().is_empty());
    }
}
