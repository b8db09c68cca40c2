//! I/O error context helpers.
//!
//! Per-entry failures end up in the run report as plain strings, so messages
//! carry the operation, the path, and a platform hint for common OS errors.
//!
//! Usage:
//!   // anyhow code paths
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;
//!
//!   // report messages
//!   let msg = describe_io_error("copy to temporary file", &tmp, &e);

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Platform hint for a raw OS error code, if we know one.
fn os_hint(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        let hint = match code {
            libc::EACCES | libc::EPERM => "permission denied; check ownership and write permissions",
            libc::EXDEV => "cross-filesystem; atomic rename not possible",
            libc::EBUSY => "resource busy; ensure no other process is writing",
            libc::ENOENT => "path not found; verify it exists",
            libc::EEXIST => "already exists; destination is never overwritten",
            libc::ENOSPC => "insufficient space on device",
            libc::EDQUOT => "disk quota exceeded",
            libc::EROFS => "read-only filesystem; cannot write here",
            libc::ELOOP => "too many symbolic link levels; possible symlink cycle",
            libc::ENAMETOOLONG => "filename or path too long",
            libc::EMFILE => "process file descriptor limit reached; lower --workers or raise limits",
            libc::ENFILE => "system-wide file table overflow; reduce open files",
            libc::EIO => "low-level I/O error; check the device",
            _ => return None,
        };
        Some(hint)
    }
    #[cfg(windows)]
    {
        let hint = match code {
            5 => "access denied; check permissions",
            17 => "not same device; cross-filesystem move",
            32 => "sharing violation; file is in use",
            2 | 3 => "path not found; verify it exists",
            80 | 183 => "already exists; destination is never overwritten",
            112 => "insufficient disk space",
            19 => "write protected / read-only media",
            206 => "filename or path too long",
            4 => "too many open files; lower --workers",
            _ => return None,
        };
        Some(hint)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; destination is never overwritten"),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Some("busy/timed out; retry later"),
        _ => None,
    }
}

/// Human-friendly message: op, path, error, hint and OS code when present.
pub fn describe_io_error(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(h) = os_hint(code) {
                msg.push_str(" (");
                msg.push_str(h);
                msg.push(')');
            }
            msg.push_str(&format!(" [os code: {code}]"));
        }
        None => {
            if let Some(h) = kind_hint(e.kind()) {
                msg.push_str(" (");
                msg.push_str(h);
                msg.push(')');
            }
        }
    }
    msg
}

/// Adapter for anyhow::Result code: `.map_err(io_error_with_help(op, path))`.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(describe_io_error(op, path, &e))
}
