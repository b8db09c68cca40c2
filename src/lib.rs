//! Core library for `reshard`.
//!
//! Reorganizes a large directory tree from a legacy layout into a new one:
//! walk the source, classify every file, refuse to start unless every file is
//! understood (or the operator overrides), then copy or move each file to its
//! mapped destination with verification. Presentation and exit codes live in
//! the binary; the library returns explicit outcomes.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod layout;
pub mod output;
pub mod platform;
pub mod preflight;
pub mod progress;
pub mod report;
pub mod run;
pub mod shutdown;
pub mod transfer;
pub mod walk;

pub use config::{
    CONFIG_ENV, Config, FileConfig, LayoutConfig, LayoutKind, LogLevel, TransferMode, VerifyMode,
    default_config_path, default_log_path, load_config_from_xml_path, load_optional,
    path_has_symlink_ancestor,
};
pub use errors::ReshardError;
pub use layout::{
    Classification, FixedDepthReroot, Layout, MappingResult, MappingRule, PathClassifier, RelPath,
    ShardBySuffix, build_layout, classify_path,
};
pub use preflight::{PreflightReport, PreflightValidator};
pub use progress::ProgressReporter;
pub use report::{Counters, EntryIssue, FailureKind, RejectReason, RunReport, TransferOutcome};
pub use run::{RunController, RunOutcome};
pub use shutdown::CancelFlag;
pub use transfer::{EntryResult, TransferExecutor};
pub use walk::{Entry, WalkItem, walk};
