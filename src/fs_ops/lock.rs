//! Advisory run lock on the destination root.
//!
//! - The lock is an exclusive `fs2` lock on `<destination_root>/.reshard.lock`.
//! - Acquisition never blocks: a second run against the same destination fails fast.
//! - Released when the guard drops. The lock file is never deleted, so every
//!   run contends on the same inode.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const LOCK_FILE_NAME: &str = ".reshard.lock";

/// RAII guard held while a run owns the destination root.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            trace!(path = %self.path.display(), error = %e, "run lock unlock failed; closing the file releases it");
        }
    }
}

/// Try to take the lock. `Ok(None)` means another holder has it.
pub fn try_acquire_run_lock(dir: &Path) -> io::Result<Option<RunLock>> {
    let path = dir.join(LOCK_FILE_NAME);
    let mut opts = OpenOptions::new();
    opts.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let file = opts.open(&path)?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            trace!(path = %path.display(), "run lock acquired");
            Ok(Some(RunLock { file, path }))
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
