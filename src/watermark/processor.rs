//! High-level watermarking API.
//!
//! `Watermarker` ties rendering and compositing together for one canvas,
//! and runs the file pipeline (load, watermark, resize, save) for one
//! image. The batch scheduler calls the same pipeline for every job.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use photomark::font::{FontRegistry, FontRegistryConfig};
//! use photomark::imaging::{OutputFormat, ResizeSpec};
//! use photomark::watermark::{Anchor, WatermarkSpec, Watermarker};
//!
//! let fonts = Arc::new(FontRegistry::new(FontRegistryConfig::default()));
//! let watermarker = Watermarker::new(fonts);
//! let spec = WatermarkSpec::text("© 2024").with_position(Anchor::BottomRight);
//!
//! watermarker.apply_file(
//!     Path::new("photo.jpg"),
//!     Path::new("photo_watermarked.jpg"),
//!     &spec,
//!     OutputFormat::Jpeg,
//!     90,
//!     &ResizeSpec::default(),
//! )?;
//! # Ok::<(), photomark::watermark::WatermarkError>(())
//! ```

use std::path::Path;
use std::sync::Arc;

use super::compositor::composite;
use super::error::WatermarkError;
use super::renderer::WatermarkRenderer;
use super::spec::WatermarkSpec;
use crate::font::FontRegistry;
use crate::imaging::{load_canvas, resize_canvas, save_canvas, Canvas, OutputFormat, ResizeSpec};

/// Applies watermark specs to canvases and image files.
#[derive(Debug, Clone)]
pub struct Watermarker {
    renderer: WatermarkRenderer,
}

impl Watermarker {
    pub fn new(fonts: Arc<FontRegistry>) -> Self {
        Self::from_renderer(WatermarkRenderer::new(fonts))
    }

    pub fn from_renderer(renderer: WatermarkRenderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &WatermarkRenderer {
        &self.renderer
    }

    /// Render `spec` for `canvas` and composite it onto a copy.
    pub fn apply(&self, canvas: &Canvas, spec: &WatermarkSpec) -> Result<Canvas, WatermarkError> {
        let rendered = self.renderer.render(spec, canvas.width(), canvas.height())?;
        Ok(composite(canvas, &rendered))
    }

    /// Load `source`, watermark it, resize it and write it to `output`.
    ///
    /// Returns the dimensions of the written image.
    pub fn apply_file(
        &self,
        source: &Path,
        output: &Path,
        spec: &WatermarkSpec,
        format: OutputFormat,
        quality: u8,
        resize: &ResizeSpec,
    ) -> Result<(u32, u32), WatermarkError> {
        let canvas = load_canvas(source)?;
        let watermarked = self.apply(&canvas, spec)?;
        let resized = resize_canvas(watermarked, resize)?;
        save_canvas(&resized, output, format, quality)?;

        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            "Watermarked image written"
        );
        Ok(resized.dimensions())
    }
}
