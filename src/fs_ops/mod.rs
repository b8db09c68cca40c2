//! Filesystem primitives used by the transfer executor.

mod atomic;
mod copy;
mod helpers;
mod io_copy;
mod lock;
mod meta;
mod util;
mod verify;

pub use copy::{StepError, durable_copy};
pub use helpers::{describe_io_error, io_error_with_help};
pub use lock::{LOCK_FILE_NAME, RunLock, try_acquire_run_lock};
pub use util::is_temp_name;
pub(crate) use util::{fsync_dir, unique_temp_path};
pub use verify::{VerifyError, hash_file, matches_existing, verify_copy};
