//! Progress accumulation shared by transfer workers.
//! Counters are atomics; the issue list sits behind a mutex since it is only
//! touched for entries that were not transferred.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::report::{Counters, EntryIssue, RejectReason, RunReport, TransferOutcome};

pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

#[derive(Debug)]
pub struct ProgressReporter {
    interval: u64,
    total: u64,
    started: Instant,
    processed: AtomicU64,
    moved: AtomicU64,
    copied: AtomicU64,
    planned: AtomicU64,
    skipped_unmatched: AtomicU64,
    skipped_rejected: AtomicU64,
    already_transferred: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
    issues: Mutex<Vec<EntryIssue>>,
}

impl ProgressReporter {
    /// `total` is the number of entries expected to be recorded.
    pub fn new(total: u64, interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            total,
            started: Instant::now(),
            processed: AtomicU64::new(0),
            moved: AtomicU64::new(0),
            copied: AtomicU64::new(0),
            planned: AtomicU64::new(0),
            skipped_unmatched: AtomicU64::new(0),
            skipped_rejected: AtomicU64::new(0),
            already_transferred: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            issues: Mutex::new(Vec::new()),
        }
    }

    /// Record one entry's outcome. `bytes` counts only data actually written.
    pub fn record(&self, path: &Path, outcome: TransferOutcome, bytes: u64, message: impl Into<String>) {
        let counter = match &outcome {
            TransferOutcome::Moved => &self.moved,
            TransferOutcome::Copied => &self.copied,
            TransferOutcome::Planned => &self.planned,
            TransferOutcome::SkippedUnmatched(_) => &self.skipped_unmatched,
            TransferOutcome::SkippedRejected(RejectReason::AlreadyTransferred) => &self.already_transferred,
            TransferOutcome::SkippedRejected(_) => &self.skipped_rejected,
            TransferOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);

        if !outcome.is_safe() && outcome != TransferOutcome::Planned {
            let message = message.into();
            if let TransferOutcome::Failed(kind) = &outcome {
                warn!(path = %path.display(), kind = %kind, %message, "transfer failed");
            }
            let issue = EntryIssue { path: path.to_path_buf(), outcome, message };
            match self.issues.lock() {
                Ok(mut g) => g.push(issue),
                Err(poisoned) => poisoned.into_inner().push(issue),
            }
        }

        let n = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.interval == 0 {
            self.emit_progress(n);
        }
    }

    fn emit_progress(&self, processed: u64) {
        let s = self.snapshot();
        info!(
            processed,
            total = self.total,
            moved = s.moved,
            copied = s.copied,
            skipped = s.skipped_unmatched + s.skipped_rejected + s.already_transferred,
            failed = s.failed,
            bytes = s.bytes,
            elapsed_s = self.elapsed().as_secs(),
            "progress"
        );
    }

    pub fn snapshot(&self) -> Counters {
        Counters {
            processed: self.processed.load(Ordering::Relaxed),
            moved: self.moved.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            planned: self.planned.load(Ordering::Relaxed),
            skipped_unmatched: self.skipped_unmatched.load(Ordering::Relaxed),
            skipped_rejected: self.skipped_rejected.load(Ordering::Relaxed),
            already_transferred: self.already_transferred.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Finalize into a report and log the closing summary.
    pub fn finish(self, dry_run: bool, cancelled: bool) -> RunReport {
        let counters = self.snapshot();
        let elapsed = self.elapsed();
        let mut issues = match self.issues.into_inner() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        issues.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            total = self.total,
            moved = counters.moved,
            copied = counters.copied,
            planned = counters.planned,
            already_transferred = counters.already_transferred,
            skipped_unmatched = counters.skipped_unmatched,
            skipped_rejected = counters.skipped_rejected,
            failed = counters.failed,
            bytes = counters.bytes,
            elapsed_ms = elapsed.as_millis() as u64,
            cancelled,
            "run finished"
        );

        RunReport {
            total_entries: self.total,
            counters,
            issues,
            elapsed,
            dry_run,
            cancelled,
        }
    }
}
