use std::fs;

use tempfile::tempdir;

use reshard::{CancelFlag, Config, LayoutConfig, RunController, RunOutcome, TransferMode, build_layout};

#[test]
fn dry_run_plans_without_touching_anything() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let dst = td.path().join("dst");
    fs::create_dir_all(src.join("t/files")).unwrap();
    fs::write(src.join("t/files/ab12-one.bin"), b"one").unwrap();
    fs::write(src.join("t/files/cd34-two.bin"), b"two").unwrap();

    let mut cfg = Config::new(&src, &dst, LayoutConfig::ShardBySuffix { anchor: Some("files".into()) });
    cfg.mode = TransferMode::Move;
    cfg.dry_run = true;
    cfg.log_file = None;
    let layout = build_layout(&cfg.layout);
    let out = RunController::new(&cfg, layout.as_ref(), CancelFlag::new()).run().unwrap();

    let RunOutcome::Completed(report) = out else { panic!("dry run should complete") };
    assert!(report.dry_run);
    assert_eq!(report.counters.planned, 2);
    assert_eq!(report.counters.moved, 0);
    assert_eq!(report.counters.bytes, 0);
    assert!(report.issues.is_empty());
    assert!(!dst.exists(), "dry run must not create the destination root");
    assert!(src.join("t/files/ab12-one.bin").exists());
    assert!(src.join("t/files/cd34-two.bin").exists());
}
