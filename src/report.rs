//! Per-entry outcomes and the final run report.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Why a transfer failed. Never fatal to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Destination already exists with different content.
    DestinationConflict,
    /// Two or more source entries map to the same destination this run.
    DestinationCollision,
    CreateDir,
    Copy,
    Metadata,
    Verify,
    Publish,
    RemoveSource,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::DestinationConflict => "destination conflict",
            FailureKind::DestinationCollision => "destination collision",
            FailureKind::CreateDir => "create directory failed",
            FailureKind::Copy => "copy failed",
            FailureKind::Metadata => "metadata preservation failed",
            FailureKind::Verify => "verification failed",
            FailureKind::Publish => "publish failed",
            FailureKind::RemoveSource => "source removal failed",
        };
        f.write_str(s)
    }
}

pub const ALREADY_TRANSFERRED: &str = "already transferred";
pub const RUN_CANCELLED: &str = "run cancelled";

/// Why an entry was deliberately not transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The destination already holds identical data.
    AlreadyTransferred,
    /// The run was cancelled before this entry was attempted.
    Cancelled,
    /// The mapping rule refused the entry.
    Mapping(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AlreadyTransferred => f.write_str(ALREADY_TRANSFERRED),
            RejectReason::Cancelled => f.write_str(RUN_CANCELLED),
            RejectReason::Mapping(reason) => f.write_str(reason),
        }
    }
}

impl Serialize for RejectReason {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Exactly one per entry; immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum TransferOutcome {
    Moved,
    Copied,
    /// Dry run: the transfer would have happened.
    Planned,
    SkippedUnmatched(String),
    SkippedRejected(RejectReason),
    Failed(FailureKind),
}

impl TransferOutcome {
    /// True when the source's data is known to exist at the destination.
    pub fn is_safe(&self) -> bool {
        match self {
            TransferOutcome::Moved
            | TransferOutcome::Copied
            | TransferOutcome::SkippedRejected(RejectReason::AlreadyTransferred) => true,
            _ => false,
        }
    }
}

/// An entry that was not safely transferred, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryIssue {
    pub path: PathBuf,
    pub outcome: TransferOutcome,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub processed: u64,
    pub moved: u64,
    pub copied: u64,
    pub planned: u64,
    pub skipped_unmatched: u64,
    pub skipped_rejected: u64,
    pub already_transferred: u64,
    pub failed: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub total_entries: u64,
    pub counters: Counters,
    /// Every entry whose data is not confirmed at the destination.
    pub issues: Vec<EntryIssue>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &EntryIssue> {
        self.issues
            .iter()
            .filter(|i| matches!(i.outcome, TransferOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.counters.failed > 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(
            f,
            "{} entries in {:.1}s{}{}",
            self.total_entries,
            self.elapsed.as_secs_f64(),
            if self.dry_run { " (dry run)" } else { "" },
            if self.cancelled { " (cancelled)" } else { "" },
        )?;
        writeln!(
            f,
            "  moved={} copied={} planned={} already_transferred={} skipped_unmatched={} skipped_rejected={} failed={} bytes={}",
            c.moved,
            c.copied,
            c.planned,
            c.already_transferred,
            c.skipped_unmatched,
            c.skipped_rejected,
            c.failed,
            c.bytes
        )?;
        if !self.issues.is_empty() {
            writeln!(f, "Not transferred:")?;
            for issue in &self.issues {
                let label = match &issue.outcome {
                    TransferOutcome::Failed(kind) => format!("failed ({kind})"),
                    TransferOutcome::SkippedUnmatched(r) => format!("unmatched ({r})"),
                    TransferOutcome::SkippedRejected(r) => format!("rejected ({r})"),
                    other => format!("{other:?}"),
                };
                writeln!(f, "  {}: {}: {}", issue.path.display(), label, issue.message)?;
            }
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
