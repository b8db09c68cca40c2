//! End-to-end layout scenarios through the RunController.

use std::fs;
use std::path::Path;

use assert_fs::TempDir;
use assert_fs::prelude::*;

use reshard::{
    CancelFlag, Config, FailureKind, LayoutConfig, RunController, RunOutcome, RunReport, TransferMode,
    TransferOutcome, build_layout,
};

fn run(cfg: &Config) -> RunOutcome {
    let layout = build_layout(&cfg.layout);
    RunController::new(cfg, layout.as_ref(), CancelFlag::new())
        .run()
        .expect("run should not hit a fatal error")
}

fn completed(out: RunOutcome) -> RunReport {
    match out {
        RunOutcome::Completed(r) => r,
        RunOutcome::Aborted(p) => panic!("unexpected preflight abort: {p:?}"),
    }
}

fn mk_cfg(src: &Path, dst: &Path, layout: LayoutConfig) -> Config {
    let mut cfg = Config::new(src, dst, layout);
    cfg.workers = 4;
    cfg.log_file = None;
    cfg
}

const ID: &str = "000c4819c0b0e6000a35ce48f1b5668a-dflt_key-0001.bin";

/// Scenario A: identifier ending in "8a" lands under files/8/a/.
#[test]
fn shard_by_suffix_inserts_two_levels() {
    let td = TempDir::new().unwrap();
    let src = td.child("src");
    src.child(format!("tenantX/drives/driveY/files/{ID}")).write_str("payload").unwrap();

    let cfg = mk_cfg(
        src.path(),
        &td.path().join("dst"),
        LayoutConfig::ShardBySuffix { anchor: Some("files".into()) },
    );
    let report = completed(run(&cfg));

    assert_eq!(report.counters.copied, 1);
    assert!(report.issues.is_empty());
    td.child(format!("dst/tenantX/drives/driveY/files/8/a/{ID}"))
        .assert("payload");
    src.child(format!("tenantX/drives/driveY/files/{ID}")).assert("payload");
}

/// Scenario B: nine segments collapse to tenant/temp/drives/drive/category/file.
#[test]
fn fixed_depth_reroot_discards_middle_segments() {
    let td = TempDir::new().unwrap();
    let src = td.child("src");
    src.child("temp/skip/driveY/uploads/a/b/c/d/report.pdf").write_str("pdf").unwrap();

    let mut cfg = mk_cfg(
        src.path(),
        &td.path().join("dst"),
        LayoutConfig::FixedDepthReroot { categories: vec!["uploads".into(), "inbox".into()] },
    );
    cfg.mode = TransferMode::Move;
    let report = completed(run(&cfg));

    assert_eq!(report.counters.moved, 1);
    td.child("dst/temp/temp/drives/driveY/uploads/report.pdf").assert("pdf");
    assert!(!src.path().join("temp/skip/driveY/uploads/a/b/c/d/report.pdf").exists());
}

/// Scenario C: a one-character identifier stops the run before anything happens.
#[test]
fn short_identifier_aborts_run() {
    let td = TempDir::new().unwrap();
    let src = td.child("src");
    src.child("t/files/x-suffix.bin").write_str("x").unwrap();
    src.child("t/files/ab-ok.bin").write_str("ok").unwrap();

    let cfg = mk_cfg(src.path(), &td.path().join("dst"), LayoutConfig::ShardBySuffix { anchor: None });
    match run(&cfg) {
        RunOutcome::Aborted(p) => {
            assert!(!p.proceed);
            assert_eq!(p.unmatched, 1);
            assert_eq!(p.counts.get("unmatched: identifier too short"), Some(&1));
            assert_eq!(p.samples[0].0, Path::new("t/files/x-suffix.bin"));
        }
        RunOutcome::Completed(_) => panic!("run must abort"),
    }
    assert!(!td.path().join("dst").exists());
}

/// Scenario D: two sources with one destination both fail; neither is removed.
#[test]
fn colliding_destinations_fail_both_in_move_mode() {
    let td = TempDir::new().unwrap();
    let src = td.child("src");
    src.child("temp/skipA/driveY/uploads/a/b/c/d/report.pdf").write_str("one").unwrap();
    src.child("temp/skipB/driveY/uploads/a/b/c/d/report.pdf").write_str("two").unwrap();
    src.child("temp/skipB/driveY/inbox/a/b/c/d/other.pdf").write_str("three").unwrap();

    let mut cfg = mk_cfg(
        src.path(),
        &td.path().join("dst"),
        LayoutConfig::FixedDepthReroot { categories: vec!["uploads".into(), "inbox".into()] },
    );
    cfg.mode = TransferMode::Move;
    let report = completed(run(&cfg));

    assert_eq!(report.counters.failed, 2);
    assert_eq!(report.counters.moved, 1);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 2);
    assert!(
        failures
            .iter()
            .all(|i| i.outcome == TransferOutcome::Failed(FailureKind::DestinationCollision))
    );
    src.child("temp/skipA/driveY/uploads/a/b/c/d/report.pdf").assert("one");
    src.child("temp/skipB/driveY/uploads/a/b/c/d/report.pdf").assert("two");
    assert!(!td.path().join("dst/temp/temp/drives/driveY/uploads/report.pdf").exists());
    td.child("dst/temp/temp/drives/driveY/inbox/other.pdf").assert("three");
}

/// Override lets matched files through; unmatched ones are reported and left alone.
#[test]
fn override_skips_unmatched_entries() {
    let td = TempDir::new().unwrap();
    let src = td.child("src");
    src.child("t/files/x-suffix.bin").write_str("x").unwrap();
    src.child("t/files/ab-ok.bin").write_str("ok").unwrap();

    let mut cfg = mk_cfg(src.path(), &td.path().join("dst"), LayoutConfig::ShardBySuffix { anchor: None });
    cfg.override_unmatched = true;
    cfg.mode = TransferMode::Move;
    let report = completed(run(&cfg));

    assert_eq!(report.counters.moved, 1);
    assert_eq!(report.counters.skipped_unmatched, 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].path, Path::new("t/files/x-suffix.bin"));
    assert_eq!(
        report.issues[0].outcome,
        TransferOutcome::SkippedUnmatched("identifier too short".into())
    );
    assert!(src.path().join("t/files/x-suffix.bin").exists());
    assert_eq!(fs::read(td.path().join("dst/t/files/a/b/ab-ok.bin")).unwrap(), b"ok");
}
