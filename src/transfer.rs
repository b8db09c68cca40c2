//! TransferExecutor: one matched entry to its resolved destination.
//!
//! Steps per entry:
//! 1. Existing destination: identical data => `SkippedRejected(AlreadyTransferred)`,
//!    anything else => `Failed(DestinationConflict)`. Never overwritten.
//! 2. Create missing ancestor directories (idempotent).
//! 3. Durable copy into a temp name, verify, publish without clobbering.
//! 4. Move mode only: fsync every directory that gained an entry, then remove
//!    the source.
//!
//! Every failure is returned as an outcome; nothing here aborts the run.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::config::{TransferMode, VerifyMode};
use crate::fs_ops::{describe_io_error, durable_copy, fsync_dir, matches_existing};
use crate::layout::RelPath;
use crate::report::{FailureKind, RejectReason, TransferOutcome};
use crate::walk::Entry;

/// Outcome of a single transfer plus what the report needs alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResult {
    pub outcome: TransferOutcome,
    /// Bytes written to the destination (0 unless data was copied).
    pub bytes: u64,
    pub message: String,
}

impl EntryResult {
    fn new(outcome: TransferOutcome, bytes: u64, message: impl Into<String>) -> Self {
        Self { outcome, bytes, message: message.into() }
    }

    fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(TransferOutcome::Failed(kind), 0, message)
    }
}

#[derive(Debug)]
pub struct TransferExecutor {
    destination_root: PathBuf,
    mode: TransferMode,
    verify: VerifyMode,
    dry_run: bool,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl TransferExecutor {
    pub fn new(destination_root: impl Into<PathBuf>, mode: TransferMode, verify: VerifyMode, dry_run: bool) -> Self {
        Self {
            destination_root: destination_root.into(),
            mode,
            verify,
            dry_run,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Mark `dest` as taken for this run. False if another entry already claimed it.
    fn claim(&self, dest: &Path) -> bool {
        let mut g = match self.claimed.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        g.insert(dest.to_path_buf())
    }

    /// Transfer `entry` to `dest_rel` under the destination root.
    pub fn transfer(&self, entry: &Entry, dest_rel: &RelPath) -> EntryResult {
        let src = entry.absolute.as_path();
        let dest = self.destination_root.join(dest_rel.to_path_buf());

        if !self.claim(&dest) {
            return EntryResult::failed(
                FailureKind::DestinationCollision,
                format!("'{}' already claimed by another entry this run", dest.display()),
            );
        }

        let src_meta = match fs::symlink_metadata(src) {
            Ok(m) if m.file_type().is_file() => m,
            Ok(_) => {
                return EntryResult::failed(
                    FailureKind::Copy,
                    format!("source '{}' is no longer a regular file", src.display()),
                );
            }
            Err(e) => return EntryResult::failed(FailureKind::Copy, describe_io_error("stat source", src, &e)),
        };

        match fs::symlink_metadata(&dest) {
            Ok(dest_meta) => return self.existing_destination(src, &src_meta, &dest, &dest_meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return EntryResult::failed(
                    FailureKind::DestinationConflict,
                    describe_io_error("stat destination", &dest, &e),
                );
            }
        }

        if self.dry_run {
            info!(src = %src.display(), dest = %dest.display(), mode = ?self.mode, "dry-run: would transfer");
            return EntryResult::new(TransferOutcome::Planned, 0, format!("would transfer to '{}'", dest.display()));
        }

        if let Some(parent) = dest.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return EntryResult::failed(FailureKind::CreateDir, describe_io_error("create destination directory", parent, &e));
            }
        }

        let bytes = match durable_copy(src, &src_meta, &dest, self.verify) {
            Ok(n) => n,
            Err(e) => return EntryResult::failed(e.kind, e.message),
        };

        match self.mode {
            TransferMode::Copy => {
                debug!(src = %src.display(), dest = %dest.display(), bytes, "copied");
                EntryResult::new(TransferOutcome::Copied, bytes, "")
            }
            TransferMode::Move => {
                if let Err((dir, e)) = sync_ancestors(&self.destination_root, &dest) {
                    return EntryResult::new(
                        TransferOutcome::Failed(FailureKind::Publish),
                        bytes,
                        format!(
                            "copied to '{}' but {}; source kept",
                            dest.display(),
                            describe_io_error("sync directory", &dir, &e)
                        ),
                    );
                }
                self.remove_source(src, &dest, bytes)
            }
        }
    }

    fn remove_source(&self, src: &Path, dest: &Path, bytes: u64) -> EntryResult {
        match fs::remove_file(src) {
            Ok(()) => {
                debug!(src = %src.display(), dest = %dest.display(), bytes, "moved");
                EntryResult::new(TransferOutcome::Moved, bytes, "")
            }
            Err(e) => EntryResult::new(
                TransferOutcome::Failed(FailureKind::RemoveSource),
                bytes,
                format!(
                    "copied to '{}' but {}",
                    dest.display(),
                    describe_io_error("remove source", src, &e)
                ),
            ),
        }
    }

    fn existing_destination(&self, src: &Path, src_meta: &fs::Metadata, dest: &Path, dest_meta: &fs::Metadata) -> EntryResult {
        match matches_existing(src, src_meta, dest_meta, dest, self.verify) {
            Ok(true) => {
                debug!(src = %src.display(), dest = %dest.display(), "already transferred");
                EntryResult::new(
                    TransferOutcome::SkippedRejected(RejectReason::AlreadyTransferred),
                    0,
                    format!("'{}' already holds this data", dest.display()),
                )
            }
            Ok(false) => EntryResult::failed(
                FailureKind::DestinationConflict,
                format!("'{}' exists with different content", dest.display()),
            ),
            Err(e) => EntryResult::failed(
                FailureKind::DestinationConflict,
                describe_io_error("compare with existing destination", dest, &e),
            ),
        }
    }
}

/// Directories above `dest`'s parent, up to and including `root`. The parent
/// itself is synced when the file is published.
fn ancestors_to_sync<'p>(root: &Path, dest: &'p Path) -> Vec<&'p Path> {
    dest.ancestors()
        .skip(2)
        .take_while(|dir| dir.starts_with(root))
        .collect()
}

/// Fsync every directory between the published file and the destination root.
fn sync_ancestors(root: &Path, dest: &Path) -> Result<(), (PathBuf, io::Error)> {
    for dir in ancestors_to_sync(root, dest) {
        fsync_dir(dir).map_err(|e| (dir.to_path_buf(), e))?;
    }
    Ok(())
}
