//! RunController: walk → classify → preflight gate → map → transfer → report.
//!
//! The controller owns no global state. It receives an explicit `Config`, the
//! selected layout and a cancellation handle, and returns either the finished
//! `RunReport` or the `PreflightReport` that stopped the run. Presentation and
//! exit codes are left to the caller.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::ReshardError;
use crate::fs_ops::{fsync_dir, try_acquire_run_lock};
use crate::layout::{Classification, Layout, MappingResult, RelPath, classify_path};
use crate::preflight::{PreflightReport, PreflightValidator};
use crate::progress::ProgressReporter;
use crate::report::{FailureKind, RejectReason, RunReport, TransferOutcome};
use crate::shutdown::CancelFlag;
use crate::transfer::{EntryResult, TransferExecutor};
use crate::walk::{Entry, WalkItem, walk};

/// How a run ended, short of a fatal error.
#[derive(Debug)]
pub enum RunOutcome {
    /// Preflight passed (or was overridden) and every entry has an outcome.
    Completed(RunReport),
    /// Unmatched entries were found without an override. Nothing was touched.
    Aborted(PreflightReport),
}

/// Classified walk output held in memory between preflight and transfer.
struct Inventory {
    entries: Vec<(Entry, Classification)>,
    skipped: Vec<(PathBuf, String)>,
    preflight: PreflightReport,
}

pub struct RunController<'a> {
    config: &'a Config,
    layout: &'a dyn Layout,
    cancel: CancelFlag,
}

impl<'a> RunController<'a> {
    pub fn new(config: &'a Config, layout: &'a dyn Layout, cancel: CancelFlag) -> Self {
        Self { config, layout, cancel }
    }

    pub fn run(&self) -> Result<RunOutcome, ReshardError> {
        let cfg = self.config;
        cfg.validate()?;

        let inventory = self.inventory();
        let preflight = &inventory.preflight;
        info!(
            layout = self.layout.name(),
            matched = preflight.matched,
            unmatched = preflight.unmatched,
            "classification complete"
        );
        for (bucket, n) in &preflight.counts {
            info!(bucket = %bucket, count = n, "preflight");
        }
        if !preflight.proceed {
            warn!(unmatched = preflight.unmatched, "aborted: unmatched entries found");
            return Ok(RunOutcome::Aborted(inventory.preflight));
        }
        if preflight.overridden {
            warn!(unmatched = preflight.unmatched, "unmatched entries present; continuing because of override");
        }
        if self.cancel.is_requested() {
            return Err(ReshardError::Interrupted);
        }

        let dest_root = &cfg.destination_root;
        let _lock = if cfg.dry_run {
            None
        } else {
            fs::create_dir_all(dest_root).map_err(|e| ReshardError::DestinationRoot {
                path: dest_root.clone(),
                context: format!("cannot create: {e}"),
            })?;
            if let Some(parent) = dest_root.parent().filter(|p| !p.as_os_str().is_empty()) {
                fsync_dir(parent).map_err(|e| ReshardError::DestinationRoot {
                    path: dest_root.clone(),
                    context: format!("cannot sync parent directory: {e}"),
                })?;
            }
            if cfg.disable_locks {
                None
            } else {
                let lock = try_acquire_run_lock(dest_root).map_err(|e| ReshardError::DestinationRoot {
                    path: dest_root.clone(),
                    context: format!("cannot open run lock: {e}"),
                })?;
                match lock {
                    Some(l) => {
                        debug!(path = %l.path().display(), "run lock held");
                        Some(l)
                    }
                    None => return Err(ReshardError::Lock(dest_root.join(crate::fs_ops::LOCK_FILE_NAME))),
                }
            }
        };

        Ok(RunOutcome::Completed(self.transfer_all(inventory)?))
    }

    fn inventory(&self) -> Inventory {
        let mut validator = PreflightValidator::new();
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for item in walk(&self.config.source_root) {
            match item {
                WalkItem::File(entry) => {
                    let class = classify_path(self.layout, &entry.relative);
                    validator.observe(&entry.relative, &class);
                    entries.push((entry, class));
                }
                WalkItem::Skipped { path, reason } => {
                    validator.observe_skip(&path, &reason);
                    skipped.push((path, reason));
                }
            }
        }
        Inventory {
            entries,
            skipped,
            preflight: validator.finish(self.config.override_unmatched),
        }
    }

    fn transfer_all(&self, inventory: Inventory) -> Result<RunReport, ReshardError> {
        let cfg = self.config;
        let total = (inventory.entries.len() + inventory.skipped.len()) as u64;
        let reporter = ProgressReporter::new(total, cfg.progress_interval);

        for (path, reason) in &inventory.skipped {
            reporter.record(path, TransferOutcome::SkippedUnmatched(reason.clone()), 0, reason.clone());
        }

        // Map every matched entry; unmatched ones only reach here under override.
        let mut jobs: Vec<(Entry, RelPath)> = Vec::with_capacity(inventory.entries.len());
        for (entry, class) in inventory.entries {
            if let Classification::Unmatched { reason } = &class {
                reporter.record(&entry.relative, TransferOutcome::SkippedUnmatched(reason.clone()), 0, reason.clone());
                continue;
            }
            let mapped = match RelPath::parse(&entry.relative) {
                Ok(rel) => self.layout.map_path(&rel, &class),
                Err(reason) => MappingResult::Rejected(reason),
            };
            match mapped {
                MappingResult::Destination(dest) => jobs.push((entry, dest)),
                MappingResult::Rejected(reason) => {
                    reporter.record(&entry.relative, TransferOutcome::SkippedRejected(RejectReason::Mapping(reason.clone())), 0, reason);
                }
            }
        }

        let jobs = self.drop_collisions(jobs, &reporter);

        let executor = TransferExecutor::new(&cfg.destination_root, cfg.mode, cfg.verify, cfg.dry_run);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.workers)
            .thread_name(|i| format!("reshard-worker-{i}"))
            .build()
            .map_err(|e| ReshardError::Config(format!("cannot start worker pool: {e}")))?;

        info!(entries = jobs.len(), workers = cfg.workers, mode = ?cfg.mode, dry_run = cfg.dry_run, "transfer starting");
        pool.install(|| run_jobs(&jobs, &self.cancel, &reporter, |entry, dest| executor.transfer(entry, dest)));

        let cancelled = self.cancel.is_requested();
        if cancelled {
            warn!("run cancelled; unattempted entries recorded as skipped");
        }
        Ok(reporter.finish(cfg.dry_run, cancelled))
    }

    /// Entries sharing a destination are all failed and removed from the job list.
    fn drop_collisions(&self, jobs: Vec<(Entry, RelPath)>, reporter: &ProgressReporter) -> Vec<(Entry, RelPath)> {
        let mut by_dest: HashMap<&RelPath, Vec<&PathBuf>> = HashMap::new();
        for (entry, dest) in &jobs {
            by_dest.entry(dest).or_default().push(&entry.relative);
        }
        let colliding: HashMap<RelPath, String> = by_dest
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(dest, sources)| {
                let list = sources
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                (dest.clone(), list)
            })
            .collect();
        if colliding.is_empty() {
            return jobs;
        }

        let mut kept = Vec::with_capacity(jobs.len());
        for (entry, dest) in jobs {
            match colliding.get(&dest) {
                Some(sources) => reporter.record(
                    &entry.relative,
                    TransferOutcome::Failed(FailureKind::DestinationCollision),
                    0,
                    format!("'{dest}' is the destination of several entries: {sources}"),
                ),
                None => kept.push((entry, dest)),
            }
        }
        kept
    }
}

/// Transfer every job, checking `cancel` before each one. Entries reached after
/// cancellation are recorded as not attempted; in-flight transfers finish.
fn run_jobs<F>(jobs: &[(Entry, RelPath)], cancel: &CancelFlag, reporter: &ProgressReporter, transfer: F)
where
    F: Fn(&Entry, &RelPath) -> EntryResult + Sync,
{
    jobs.par_iter().for_each(|(entry, dest)| {
        if cancel.is_requested() {
            reporter.record(
                &entry.relative,
                TransferOutcome::SkippedRejected(RejectReason::Cancelled),
                0,
                "not attempted",
            );
            return;
        }
        let r = transfer(entry, dest);
        reporter.record(&entry.relative, r.outcome, r.bytes, r.message);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, TransferMode};
    use crate::config::VerifyMode;
    use crate::layout::build_layout;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, data: &[u8]) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, data).unwrap();
    }

    fn shard_config(src: &Path, dst: &Path) -> Config {
        let mut cfg = Config::new(src, dst, LayoutConfig::ShardBySuffix { anchor: None });
        cfg.workers = 2;
        cfg.log_file = None;
        cfg
    }

    #[test]
    fn completes_and_shards_files() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        write(&src, "t/files/0a8-k.bin", b"one");
        write(&src, "t/files/1b9-k.bin", b"two");
        let cfg = shard_config(&src, &td.path().join("dst"));
        let layout = build_layout(&cfg.layout);
        let out = RunController::new(&cfg, layout.as_ref(), CancelFlag::new()).run().unwrap();
        let RunOutcome::Completed(report) = out else { panic!("expected completion") };
        assert_eq!(report.counters.copied, 2);
        assert!(td.path().join("dst/t/files/a/8/0a8-k.bin").exists());
        assert!(td.path().join("dst/t/files/b/9/1b9-k.bin").exists());
        assert!(td.path().join("dst").join(crate::fs_ops::LOCK_FILE_NAME).exists());
    }

    #[test]
    fn unmatched_aborts_before_any_mutation() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        write(&src, "t/files/0a8-k.bin", b"one");
        write(&src, "t/files/x-suffix.bin", b"two");
        let mut cfg = shard_config(&src, &td.path().join("dst"));
        cfg.mode = TransferMode::Move;
        let layout = build_layout(&cfg.layout);
        let out = RunController::new(&cfg, layout.as_ref(), CancelFlag::new()).run().unwrap();
        let RunOutcome::Aborted(pre) = out else { panic!("expected abort") };
        assert_eq!(pre.unmatched, 1);
        assert!(!td.path().join("dst").exists());
        assert!(src.join("t/files/0a8-k.bin").exists());
    }

    #[test]
    fn cancelled_run_attempts_nothing() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        write(&src, "t/files/0a8-k.bin", b"one");
        let cfg = shard_config(&src, &td.path().join("dst"));
        let layout = build_layout(&cfg.layout);
        let cancel = CancelFlag::new();
        cancel.request();
        let err = RunController::new(&cfg, layout.as_ref(), cancel).run().unwrap_err();
        assert!(matches!(err, ReshardError::Interrupted));
        assert!(!td.path().join("dst").exists());
    }

    #[test]
    fn cancel_mid_run_skips_remaining_entries() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        let jobs: Vec<(Entry, RelPath)> = (0..6)
            .map(|i| {
                let rel = format!("t/files/a{i}-k.bin");
                write(&src, &rel, b"data");
                let entry = Entry {
                    relative: PathBuf::from(&rel),
                    absolute: src.join(&rel),
                    size: 4,
                    modified: None,
                };
                let dest = RelPath::parse(Path::new(&format!("t/files/a/{i}/a{i}-k.bin"))).unwrap();
                (entry, dest)
            })
            .collect();

        let cancel = CancelFlag::new();
        let reporter = ProgressReporter::new(jobs.len() as u64, 1000);
        let executor = TransferExecutor::new(&dst, TransferMode::Move, VerifyMode::Size, false);
        let done = AtomicUsize::new(0);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        pool.install(|| {
            run_jobs(&jobs, &cancel, &reporter, |entry, dest| {
                let r = executor.transfer(entry, dest);
                if done.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                    cancel.request();
                }
                r
            })
        });
        let report = reporter.finish(false, cancel.is_requested());

        assert!(report.cancelled);
        assert_eq!(report.counters.moved, 2);
        assert_eq!(report.counters.skipped_rejected, 4);
        assert_eq!(report.counters.processed, 6);
        let skipped: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.outcome == TransferOutcome::SkippedRejected(RejectReason::Cancelled))
            .collect();
        assert_eq!(skipped.len(), 4);
        for issue in skipped {
            assert!(src.join(&issue.path).exists(), "unattempted source must stay");
        }
        let moved = jobs.iter().filter(|(e, _)| !e.absolute.exists()).count();
        assert_eq!(moved, 2);
    }

    #[test]
    fn held_lock_is_fatal() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        write(&src, "t/files/0a8-k.bin", b"one");
        fs::create_dir_all(&dst).unwrap();
        let _held = try_acquire_run_lock(&dst).unwrap().unwrap();
        let cfg = shard_config(&src, &dst);
        let layout = build_layout(&cfg.layout);
        let err = RunController::new(&cfg, layout.as_ref(), CancelFlag::new()).run().unwrap_err();
        assert!(matches!(err, ReshardError::Lock(_)));
        assert!(!dst.join("t").exists());
    }
}
