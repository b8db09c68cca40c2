use std::fs;

use tempfile::tempdir;

use reshard::fs_ops::{LOCK_FILE_NAME, try_acquire_run_lock};
use reshard::{CancelFlag, Config, LayoutConfig, ReshardError, RunController, RunOutcome, build_layout};

fn setup() -> (tempfile::TempDir, Config) {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    fs::create_dir_all(src.join("t/files")).unwrap();
    fs::create_dir_all(&dst).unwrap();
    fs::write(src.join("t/files/ab12-one.bin"), b"one").unwrap();
    let mut cfg = Config::new(&src, &dst, LayoutConfig::ShardBySuffix { anchor: None });
    cfg.log_file = None;
    (td, cfg)
}

#[test]
fn second_lock_holder_is_refused() {
    let td = tempdir().unwrap();
    let first = try_acquire_run_lock(td.path()).unwrap();
    assert!(first.is_some());
    assert!(td.path().join(LOCK_FILE_NAME).exists());
    assert!(try_acquire_run_lock(td.path()).unwrap().is_none());
    drop(first);
    assert!(try_acquire_run_lock(td.path()).unwrap().is_some());
}

#[test]
fn run_fails_fast_when_destination_is_locked() {
    let (_td, cfg) = setup();
    let _held = try_acquire_run_lock(&cfg.destination_root).unwrap().expect("lock");
    let layout = build_layout(&cfg.layout);
    let err = RunController::new(&cfg, layout.as_ref(), CancelFlag::new())
        .run()
        .expect_err("locked destination must be fatal");
    assert!(matches!(err, ReshardError::Lock(_)));
    assert_eq!(err.code(), 20);
    assert!(cfg.source_root.join("t/files/ab12-one.bin").exists());
}

#[test]
fn disable_locks_skips_the_lock() {
    let (_td, mut cfg) = setup();
    cfg.disable_locks = true;
    let _held = try_acquire_run_lock(&cfg.destination_root).unwrap().expect("lock");
    let layout = build_layout(&cfg.layout);
    let out = RunController::new(&cfg, layout.as_ref(), CancelFlag::new()).run().unwrap();
    let RunOutcome::Completed(report) = out else { panic!("expected completion") };
    assert_eq!(report.counters.copied, 1);
}
