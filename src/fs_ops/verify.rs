//! Copy verification and "already transferred" detection.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use filetime::FileTime;
use thiserror::Error;

use crate::config::VerifyMode;

const HASH_BUF: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("content hash mismatch")]
    HashMismatch,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// blake3 digest of a file's contents.
pub fn hash_file(path: &Path) -> io::Result<blake3::Hash> {
    let mut f = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; HASH_BUF];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Check that `copy` holds `src`'s data: size always, full hash in `Hash` mode.
pub fn verify_copy(src: &Path, copy: &Path, expected_size: u64, mode: VerifyMode) -> Result<(), VerifyError> {
    let actual = fs::metadata(copy)?.len();
    if actual != expected_size {
        return Err(VerifyError::SizeMismatch { expected: expected_size, actual });
    }
    if mode == VerifyMode::Hash && hash_file(src)? != hash_file(copy)? {
        return Err(VerifyError::HashMismatch);
    }
    Ok(())
}

/// Whether an existing destination already holds this source's data.
/// Size mode compares size and whole-second mtime; hash mode compares size and content.
pub fn matches_existing(src: &Path, src_meta: &fs::Metadata, dest_meta: &fs::Metadata, dest: &Path, mode: VerifyMode) -> io::Result<bool> {
    if !dest_meta.is_file() || dest_meta.len() != src_meta.len() {
        return Ok(false);
    }
    match mode {
        VerifyMode::Size => {
            let s = FileTime::from_last_modification_time(src_meta).unix_seconds();
            let d = FileTime::from_last_modification_time(dest_meta).unix_seconds();
            Ok(s == d)
        }
        VerifyMode::Hash => Ok(hash_file(src)? == hash_file(dest)?),
    }
}
