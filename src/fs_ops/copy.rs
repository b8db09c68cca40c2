//! Durable copy of one file to its final destination:
//! - Streams into a hidden temp file in the destination directory (fsynced)
//! - Applies the source's timestamps and permissions to the temp file
//! - Verifies the temp file (size, or full content hash)
//! - Publishes it under the final name without replacing anything
//!
//! The temp file is removed on every failure path, so an interrupted or failed
//! copy never becomes visible under the destination name.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::VerifyMode;
use crate::report::FailureKind;

use super::atomic::publish_no_clobber;
use super::helpers::describe_io_error;
use super::io_copy::copy_streaming;
use super::meta::preserve_metadata;
use super::util::unique_temp_path;
use super::verify::verify_copy;

/// A failed step, already classified for the run report.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct StepError {
    pub kind: FailureKind,
    pub message: String,
}

impl StepError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Copy `src` to `dest` (whose parent must exist). Returns bytes written.
pub fn durable_copy(src: &Path, src_meta: &fs::Metadata, dest: &Path, verify: VerifyMode) -> Result<u64, StepError> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| StepError::new(FailureKind::Publish, format!("destination has no parent: {}", dest.display())))?;
    let tmp = unique_temp_path(dest_dir);

    let result = stage_and_publish(src, src_meta, &tmp, dest, verify);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn stage_and_publish(
    src: &Path,
    src_meta: &fs::Metadata,
    tmp: &Path,
    dest: &Path,
    verify: VerifyMode,
) -> Result<u64, StepError> {
    let bytes = copy_streaming(src, tmp).map_err(|e| {
        StepError::new(FailureKind::Copy, describe_io_error("copy to temporary file", tmp, &e))
    })?;
    if bytes != src_meta.len() {
        return Err(StepError::new(
            FailureKind::Verify,
            format!(
                "source '{}' changed during copy: expected {} bytes, copied {}",
                src.display(),
                src_meta.len(),
                bytes
            ),
        ));
    }

    preserve_metadata(tmp, src_meta).map_err(|e| {
        StepError::new(FailureKind::Metadata, describe_io_error("preserve metadata", tmp, &e))
    })?;

    verify_copy(src, tmp, src_meta.len(), verify)
        .map_err(|e| StepError::new(FailureKind::Verify, format!("verify '{}': {}", tmp.display(), e)))?;

    publish_no_clobber(tmp, dest).map_err(|e| {
        let kind = if e.kind() == std::io::ErrorKind::AlreadyExists {
            FailureKind::DestinationConflict
        } else {
            FailureKind::Publish
        };
        StepError::new(kind, describe_io_error("publish", dest, &e))
    })?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::util::is_temp_name;
    use tempfile::tempdir;

    fn no_temps(dir: &Path) -> bool {
        fs::read_dir(dir)
            .unwrap()
            .flatten()
            .all(|e| !is_temp_name(&e.file_name().to_string_lossy()))
    }

    #[test]
    fn copies_and_leaves_no_temp() {
        let td = tempdir().unwrap();
        let src = td.path().join("src.txt");
        fs::write(&src, "hello world").unwrap();
        let dest_dir = td.path().join("out");
        fs::create_dir_all(&dest_dir).unwrap();
        let dest = dest_dir.join("dest.txt");

        let meta = fs::metadata(&src).unwrap();
        let n = durable_copy(&src, &meta, &dest, VerifyMode::Hash).unwrap();
        assert_eq!(n, 11);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello world");
        assert!(no_temps(&dest_dir));
    }

    #[test]
    fn existing_destination_is_conflict_and_untouched() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::write(&src, "new").unwrap();
        let dest = td.path().join("dest");
        fs::write(&dest, "old").unwrap();

        let meta = fs::metadata(&src).unwrap();
        let err = durable_copy(&src, &meta, &dest, VerifyMode::Size).unwrap_err();
        assert_eq!(err.kind, FailureKind::DestinationConflict);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");
        assert!(no_temps(td.path()));
    }

    #[test]
    fn source_changed_since_stat_fails_verify() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::write(&src, "short").unwrap();
        let stale = fs::metadata(&src).unwrap();
        fs::write(&src, "much longer now").unwrap();
        let dest = td.path().join("dest");

        let err = durable_copy(&src, &stale, &dest, VerifyMode::Size).unwrap_err();
        assert_eq!(err.kind, FailureKind::Verify);
        assert!(!dest.exists());
        assert!(no_temps(td.path()));
    }

    #[cfg(unix)]
    #[test]
    fn preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::write(&src, "contents").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o640)).unwrap();
        let dest = td.path().join("dest");

        durable_copy(&src, &fs::metadata(&src).unwrap(), &dest, VerifyMode::Size).unwrap();
        assert_eq!(fs::metadata(&dest).unwrap().permissions().mode() & 0o777, 0o640);
    }
}
