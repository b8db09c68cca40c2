//! Metadata preservation: timestamps (atime, mtime) and permissions.
//! Unlike a best-effort copy helper, failures here are reported; a copy
//! without its timestamps would defeat the "already transferred" check.

use filetime::{FileTime, set_file_times};
use std::fs;
use std::io;
use std::path::Path;

/// Apply `src_meta`'s timestamps and permission bits to `dest`.
pub(crate) fn preserve_metadata(dest: &Path, src_meta: &fs::Metadata) -> io::Result<()> {
    let mtime = FileTime::from_last_modification_time(src_meta);
    let atime = FileTime::from_last_access_time(src_meta);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = src_meta.permissions().mode() & 0o7777;
        set_file_times(dest, atime, mtime)?;
        fs::set_permissions(dest, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    {
        set_file_times(dest, atime, mtime)?;
        let mut perms = fs::metadata(dest)?.permissions();
        perms.set_readonly(src_meta.permissions().readonly());
        fs::set_permissions(dest, perms)?;
    }
    Ok(())
}
