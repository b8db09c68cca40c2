//! Preflight gate.
//!
//! Consumes the whole classification pass before anything is mutated, counts
//! entries per classification bucket, and decides whether the run may proceed.
//! Default is fail-closed: any unmatched entry (or walk skip) stops the run
//! unless the operator explicitly overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::layout::Classification;

/// Number of unmatched sample paths kept for operator review.
pub const SAMPLE_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreflightReport {
    pub proceed: bool,
    pub overridden: bool,
    /// Counts per bucket label, e.g. `matched: shard-by-suffix` or `unmatched: unexpected path depth`.
    pub counts: BTreeMap<String, u64>,
    pub matched: u64,
    pub unmatched: u64,
    /// First few unmatched paths with their reasons.
    pub samples: Vec<(PathBuf, String)>,
}

/// Aggregates classifications; call `finish` once the pass is complete.
#[derive(Debug, Default)]
pub struct PreflightValidator {
    report: PreflightReport,
}

impl PreflightValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, path: &Path, class: &Classification) {
        *self.report.counts.entry(class.label()).or_default() += 1;
        match class {
            Classification::Matched { .. } => self.report.matched += 1,
            Classification::Unmatched { reason } => self.unmatched(path, reason),
        }
    }

    /// Record an entry the walker could not turn into a file entry.
    pub fn observe_skip(&mut self, path: &Path, reason: &str) {
        *self.report.counts.entry(format!("skipped: {reason}")).or_default() += 1;
        self.unmatched(path, reason);
    }

    fn unmatched(&mut self, path: &Path, reason: &str) {
        self.report.unmatched += 1;
        if self.report.samples.len() < SAMPLE_LIMIT {
            self.report.samples.push((path.to_path_buf(), reason.to_string()));
        }
    }

    /// Decide: proceed iff nothing is unmatched, or the operator overrode the gate.
    pub fn finish(mut self, override_unmatched: bool) -> PreflightReport {
        let clean = self.report.unmatched == 0;
        self.report.proceed = clean || override_unmatched;
        self.report.overridden = !clean && override_unmatched;
        self.report
    }
}

/// One-shot helper over an iterator of (path, classification) pairs.
pub fn validate<'a, I>(items: I, override_unmatched: bool) -> PreflightReport
where
    I: IntoIterator<Item = (&'a Path, &'a Classification)>,
{
    let mut v = PreflightValidator::new();
    for (path, class) in items {
        v.observe(path, class);
    }
    v.finish(override_unmatched)
}
