//! Shared helpers: builtin-font watermarker, source images on disk and a
//! recording batch observer.

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use photomark::batch::{BatchObserver, BatchScheduler, BatchSummary};
use photomark::font::{FontRegistry, FontRegistryConfig};
use photomark::watermark::Watermarker;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Watermarker that never touches system fonts.
pub fn builtin_watermarker() -> Watermarker {
    Watermarker::new(Arc::new(FontRegistry::new(
        FontRegistryConfig::builtin_only(),
    )))
}

pub fn builtin_scheduler() -> BatchScheduler {
    BatchScheduler::new(builtin_watermarker())
}

/// Write a solid grey PNG and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, Rgba([100, 100, 100, 255]))
        .save(&path)
        .unwrap();
    path
}

/// Write `count` copies of a PNG named `img_000.png`, `img_001.png`, ...
pub fn write_pngs(dir: &Path, count: usize, width: u32, height: u32) -> Vec<PathBuf> {
    (0..count)
        .map(|i| write_png(dir, &format!("img_{:03}.png", i), width, height))
        .collect()
}

#[derive(Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<(u8, PathBuf)>>,
    pub errors: Mutex<Vec<(String, PathBuf)>>,
    pub completions: Mutex<Vec<BatchSummary>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn percents(&self) -> Vec<u8> {
        self.progress.lock().iter().map(|(p, _)| *p).collect()
    }
}

impl BatchObserver for RecordingObserver {
    fn on_progress(&self, percent: u8, path: &Path) {
        self.progress.lock().push((percent, path.to_path_buf()));
    }

    fn on_complete(&self, summary: &BatchSummary) {
        self.completions.lock().push(*summary);
    }

    fn on_error(&self, message: &str, path: &Path) {
        self.errors.lock().push((message.to_string(), path.to_path_buf()));
    }
}
