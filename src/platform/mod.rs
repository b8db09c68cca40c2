//! Platform-specific helpers.
//! Hides Unix/Windows differences for the few files this tool writes outside
//! the destination tree: the log file and the exported report.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{open_log_file_secure_append, write_report_atomic};

#[cfg(not(unix))]
pub use windows::{open_log_file_secure_append, write_report_atomic};
