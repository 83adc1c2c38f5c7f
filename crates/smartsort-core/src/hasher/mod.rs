mod digest;

pub use digest::{hash_file, Blake3Hasher, HASH_CHUNK_SIZE};

use std::io;
use std::path::Path;

/// Full-content digest of a file, used to confirm exact duplicates.
pub trait ContentHasher {
    fn content_hash(&self, path: &Path) -> io::Result<String>;
}
