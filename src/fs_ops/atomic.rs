//! Publish a finished temp file under its final name without ever replacing
//! an existing file.
//! - Preferred: hard link temp -> dest (fails with AlreadyExists if dest is taken), then unlink temp.
//! - Filesystems without hard links: check-then-rename fallback.
//! - On Unix, the destination directory is fsynced afterwards; a failed sync is an error.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use super::util::fsync_dir;

pub(crate) fn publish_no_clobber(tmp: &Path, dest: &Path) -> io::Result<()> {
    match fs::hard_link(tmp, dest) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(tmp) {
                warn!(tmp = %tmp.display(), error = %e, "published, but failed to remove temp link");
            }
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
        Err(e) => {
            debug!(error = %e, dest = %dest.display(), "hard link unavailable, using rename");
            if fs::symlink_metadata(dest).is_ok() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("destination appeared during copy: {}", dest.display()),
                ));
            }
            fs::rename(tmp, dest)?;
        }
    }

    if let Some(parent) = dest.parent() {
        fsync_dir(parent).map_err(|e| io::Error::new(e.kind(), format!("published, but directory sync failed: {e}")))?;
    }
    Ok(())
}
