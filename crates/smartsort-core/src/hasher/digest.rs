use super::ContentHasher;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const HASH_CHUNK_SIZE: usize = 1024 * 1024; // 1MB

/// Streams a file through BLAKE3 in fixed-size chunks; the file is never
/// held in memory as a whole.
pub fn hash_file(file: &Path) -> io::Result<String> {
    let mut f = File::open(file)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let bytes_read = match f.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn content_hash(&self, path: &Path) -> io::Result<String> {
        hash_file(path)
    }
}
