//! Batch scheduler end-to-end tests: real files in temp directories,
//! builtin font only.

use super::test_harness::{builtin_scheduler, write_png, write_pngs, RecordingObserver};
use photomark::batch::{BatchError, BatchOptions, BatchState, CancelOutcome};
use photomark::imaging::{OutputFormat, ResizeSpec};
use photomark::watermark::{Anchor, WatermarkSpec};
use std::time::Duration;

fn spec() -> WatermarkSpec {
    WatermarkSpec::text("© Batch").with_position(Anchor::Center)
}

#[test]
fn test_three_images_complete_with_full_progress() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_pngs(dir.path(), 3, 500, 300);
    let out = dir.path().join("out");
    let scheduler = builtin_scheduler();
    let observer = RecordingObserver::new();

    scheduler
        .start_with(sources.clone(), &spec(), &BatchOptions::new(&out), observer.clone())
        .unwrap();
    let summary = scheduler.wait().unwrap();

    assert_eq!(summary.processed_count, 3);
    assert_eq!(summary.total_count, 3);
    assert_eq!(summary.failed_count, 0);
    assert!(summary.success);
    assert!(!summary.cancelled);

    assert_eq!(observer.percents(), vec![33, 66, 100]);
    let reported: Vec<_> = observer.progress.lock().iter().map(|(_, p)| p.clone()).collect();
    assert_eq!(reported, sources);
    assert_eq!(*observer.completions.lock(), vec![summary]);

    for i in 0..3 {
        assert!(out.join(format!("img_{:03}.png", i)).exists());
    }
    assert_eq!(scheduler.state(), BatchState::Idle);
}

#[test]
fn test_failed_image_does_not_stop_batch() {
    let dir = tempfile::tempdir().unwrap();
    let good_a = write_png(dir.path(), "a.png", 60, 40);
    let broken = dir.path().join("b.png");
    std::fs::write(&broken, b"definitely not a png").unwrap();
    let good_c = write_png(dir.path(), "c.png", 60, 40);
    let out = dir.path().join("out");

    let scheduler = builtin_scheduler();
    let observer = RecordingObserver::new();
    scheduler
        .start_with(
            [&good_a, &broken, &good_c],
            &spec(),
            &BatchOptions::new(&out),
            observer.clone(),
        )
        .unwrap();
    let summary = scheduler.wait().unwrap();

    assert_eq!(summary.processed_count, 3);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.succeeded_count(), 2);
    assert!(summary.success);

    let errors = observer.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, broken);
    assert!(!errors[0].0.is_empty());

    assert_eq!(observer.percents(), vec![33, 66, 100]);
    assert!(out.join("a.png").exists());
    assert!(!out.join("b.png").exists());
    assert!(out.join("c.png").exists());
}

#[test]
fn test_progress_reaches_100_when_last_image_fails() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_png(dir.path(), "a.png", 60, 40);
    let corrupt = dir.path().join("z.png");
    std::fs::write(&corrupt, b"nope").unwrap();

    let scheduler = builtin_scheduler();
    let observer = RecordingObserver::new();
    scheduler
        .start_with(
            [&good, &corrupt],
            &spec(),
            &BatchOptions::new(dir.path().join("out")),
            observer.clone(),
        )
        .unwrap();
    let summary = scheduler.wait().unwrap();

    assert!(!summary.cancelled);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(observer.percents(), vec![50, 100]);
    assert_eq!(observer.progress.lock().last().unwrap().1, corrupt);
    assert_eq!(observer.errors.lock().len(), 1);
}

#[test]
fn test_cancel_right_after_start_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_pngs(dir.path(), 100, 400, 300);
    let scheduler = builtin_scheduler().with_cancel_timeout(Duration::from_secs(30));
    let observer = RecordingObserver::new();

    scheduler
        .start_with(
            sources,
            &spec().with_tiling(10),
            &BatchOptions::new(dir.path().join("out")),
            observer.clone(),
        )
        .unwrap();

    let summary = match scheduler.cancel() {
        CancelOutcome::Stopped(summary) => summary,
        other => panic!("expected the worker to stop, got {:?}", other),
    };

    assert!(summary.cancelled);
    assert!(!summary.success);
    assert!(summary.processed_count < summary.total_count);
    assert_eq!(summary.total_count, 100);
    assert_eq!(observer.completions.lock().len(), 1);
    assert_eq!(scheduler.state(), BatchState::Idle);
}

#[test]
fn test_second_start_while_running_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_pngs(dir.path(), 50, 400, 300);
    let options = BatchOptions::new(dir.path().join("out"));
    let scheduler = builtin_scheduler().with_cancel_timeout(Duration::from_secs(30));

    scheduler
        .start_with(sources.clone(), &spec(), &options, RecordingObserver::new())
        .unwrap();
    let err = scheduler
        .start_with(sources, &spec(), &options, RecordingObserver::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::AlreadyRunning));

    scheduler.cancel();
    assert!(!scheduler.is_processing());
}

#[test]
fn test_scheduler_is_reusable_after_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_pngs(dir.path(), 20, 200, 150);
    let options = BatchOptions::new(dir.path().join("out"));
    let scheduler = builtin_scheduler().with_cancel_timeout(Duration::from_secs(30));

    scheduler
        .start_with(sources.clone(), &spec(), &options, RecordingObserver::new())
        .unwrap();
    scheduler.cancel();

    let observer = RecordingObserver::new();
    scheduler
        .start_with(sources[..2].to_vec(), &spec(), &options, observer.clone())
        .unwrap();
    let summary = scheduler.wait().unwrap();
    assert_eq!(summary.processed_count, 2);
    assert!(!summary.cancelled);
    assert_eq!(observer.percents(), vec![50, 100]);
}

#[test]
fn test_output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "photo.png", 50, 50);
    let out = dir.path().join("nested").join("deeper");
    let scheduler = builtin_scheduler();

    scheduler
        .start_with([source], &spec(), &BatchOptions::new(&out), RecordingObserver::new())
        .unwrap();
    scheduler.wait();

    assert!(out.join("photo.png").exists());
}

#[test]
fn test_output_dir_failure_leaves_scheduler_idle() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "photo.png", 50, 50);
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();
    let scheduler = builtin_scheduler();

    let err = scheduler
        .start_with(
            [source],
            &spec(),
            &BatchOptions::new(blocker.join("out")),
            RecordingObserver::new(),
        )
        .unwrap_err();

    assert!(matches!(err, BatchError::OutputDir { .. }));
    assert_eq!(scheduler.state(), BatchState::Idle);
    assert!(scheduler.wait().is_none());
}

#[test]
fn test_same_directory_output_keeps_original() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "holiday.png", 80, 60);
    let before = std::fs::read(&source).unwrap();
    let scheduler = builtin_scheduler();

    scheduler
        .start_with(
            [&source],
            &spec(),
            &BatchOptions::new(dir.path()).with_rename("wm_", "_v2"),
            RecordingObserver::new(),
        )
        .unwrap();
    scheduler.wait();

    assert_eq!(std::fs::read(&source).unwrap(), before);
    assert!(dir.path().join("wm_holiday_v2_watermarked.png").exists());
}

#[test]
fn test_format_quality_and_resize_apply_to_every_job() {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_pngs(dir.path(), 2, 200, 100);
    let out = dir.path().join("out");
    let options = BatchOptions::new(&out)
        .with_format(OutputFormat::Jpeg)
        .with_quality(70)
        .with_resize(ResizeSpec {
            width: Some(100),
            height: None,
            percentage: None,
        });
    let scheduler = builtin_scheduler();

    scheduler
        .start_with(sources, &spec(), &options, RecordingObserver::new())
        .unwrap();
    assert_eq!(scheduler.wait().unwrap().failed_count, 0);

    for name in ["img_000.jpg", "img_001.jpg"] {
        let written = image::open(out.join(name)).unwrap();
        assert_eq!((written.width(), written.height()), (100, 50));
    }
}
