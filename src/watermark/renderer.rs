//! Watermark rendering.
//!
//! Turns a `WatermarkSpec` into a transparent RGBA buffer plus its
//! placement(s). Text goes through the font registry; image watermarks are
//! loaded from disk, scaled and faded. Both are rotated last with canvas
//! expansion.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::compositor::{blend_pixels, RenderedWatermark, WatermarkLayer};
use super::error::WatermarkError;
use super::position::{calculate_tiled_positions, resolve_position, Dimensions, DEFAULT_MARGIN};
use super::rotate::rotate_image;
use super::spec::{ImageWatermark, RgbColor, TextWatermark, WatermarkKind, WatermarkSpec};
use crate::font::{FontHandle, FontRegistry};
use crate::imaging::{load_rgba, resize_rgba};

/// Transparent border around rendered text, room for stroke and shadow.
pub const TEXT_PADDING: u32 = 10;

/// Offset of each stroke copy and of the drop shadow.
const EFFECT_OFFSET: i32 = 2;

const STROKE_OFFSETS: [(i32, i32); 8] = [
    (-EFFECT_OFFSET, 0),
    (EFFECT_OFFSET, 0),
    (0, -EFFECT_OFFSET),
    (0, EFFECT_OFFSET),
    (-EFFECT_OFFSET, -EFFECT_OFFSET),
    (EFFECT_OFFSET, -EFFECT_OFFSET),
    (-EFFECT_OFFSET, EFFECT_OFFSET),
    (EFFECT_OFFSET, EFFECT_OFFSET),
];

/// Renders watermark specs into placed RGBA buffers.
#[derive(Debug, Clone)]
pub struct WatermarkRenderer {
    fonts: Arc<FontRegistry>,
}

impl WatermarkRenderer {
    pub fn new(fonts: Arc<FontRegistry>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &Arc<FontRegistry> {
        &self.fonts
    }

    /// Render `spec` for a canvas of `canvas_width` x `canvas_height`.
    pub fn render(
        &self,
        spec: &WatermarkSpec,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<RenderedWatermark, WatermarkError> {
        let Some(buffer) = self.render_buffer(spec)? else {
            return Ok(RenderedWatermark::Empty);
        };

        let canvas = Dimensions::new(canvas_width, canvas_height);
        let mark = Dimensions::new(buffer.width(), buffer.height());
        let buffer = Arc::new(buffer);

        if spec.tiled {
            let placements = calculate_tiled_positions(canvas, mark, spec.tile_spacing);
            tracing::debug!(
                tile_width = mark.width,
                tile_height = mark.height,
                tiles = placements.len(),
                "Tiled watermark rendered"
            );
            return Ok(RenderedWatermark::Tiled {
                tile: buffer,
                placements,
            });
        }

        let position = resolve_position(&spec.position, canvas, mark, DEFAULT_MARGIN);
        tracing::debug!(
            width = mark.width,
            height = mark.height,
            x = position.x,
            y = position.y,
            "Watermark rendered"
        );
        Ok(RenderedWatermark::Single(WatermarkLayer {
            image: buffer,
            position,
        }))
    }

    /// Render the watermark buffer alone, before placement.
    ///
    /// Returns `None` when there is nothing to draw.
    pub fn render_buffer(&self, spec: &WatermarkSpec) -> Result<Option<RgbaImage>, WatermarkError> {
        spec.validate()?;
        match &spec.kind {
            WatermarkKind::Text(text) => Ok(self.render_text(text, spec)),
            WatermarkKind::Image(image) => render_image(image, spec).map(Some),
        }
    }

    fn render_text(&self, text: &TextWatermark, spec: &WatermarkSpec) -> Option<RgbaImage> {
        if text.text.is_empty() {
            return None;
        }

        let font = self.fonts.resolve(text.font_name.as_deref(), text.font_size);
        if font.is_degraded() && !font.covers(&text.text) {
            tracing::warn!(
                font = ?text.font_name,
                "No installed font covers the watermark text, glyphs will be boxes"
            );
        }

        let (width, height) = font.measure(&text.text);
        if width == 0 || height == 0 {
            return None;
        }

        let mut buffer = RgbaImage::new(width + 2 * TEXT_PADDING, height + 2 * TEXT_PADDING);
        let alpha = (255 * spec.opacity.min(100) as u32 / 100) as u8;
        let effect_alpha = alpha / 2;
        let origin = TEXT_PADDING as i32;

        if text.has_stroke {
            for (dx, dy) in STROKE_OFFSETS {
                draw_text(
                    &mut buffer,
                    &font,
                    &text.text,
                    (origin + dx, origin + dy),
                    RgbColor::BLACK,
                    effect_alpha,
                );
            }
        }

        if text.has_shadow {
            draw_text(
                &mut buffer,
                &font,
                &text.text,
                (origin + EFFECT_OFFSET, origin + EFFECT_OFFSET),
                RgbColor::BLACK,
                effect_alpha,
            );
        }

        draw_text(
            &mut buffer,
            &font,
            &text.text,
            (origin, origin),
            text.font_color,
            alpha,
        );

        Some(rotate_image(&buffer, spec.rotation_degrees))
    }
}

fn draw_text(
    buffer: &mut RgbaImage,
    font: &FontHandle,
    text: &str,
    (x, y): (i32, i32),
    color: RgbColor,
    alpha: u8,
) {
    if alpha == 0 {
        return;
    }
    let (width, height) = (buffer.width() as i32, buffer.height() as i32);

    font.rasterize(text, x, y, |px, py, coverage| {
        if px < 0 || py < 0 || px >= width || py >= height {
            return;
        }
        let pixel_alpha = (coverage.clamp(0.0, 1.0) * alpha as f32).round() as u8;
        if pixel_alpha == 0 {
            return;
        }
        let existing = buffer.get_pixel_mut(px as u32, py as u32);
        *existing = blend_pixels(*existing, Rgba([color.r, color.g, color.b, pixel_alpha]));
    });
}

fn render_image(image: &ImageWatermark, spec: &WatermarkSpec) -> Result<RgbaImage, WatermarkError> {
    let mut buffer = load_rgba(&image.source_path).map_err(|source| WatermarkError::SourceImage {
        path: image.source_path.clone(),
        source,
    })?;

    if image.scale != 1.0 {
        let width = ((buffer.width() as f32 * image.scale) as u32).max(1);
        let height = ((buffer.height() as f32 * image.scale) as u32).max(1);
        buffer = resize_rgba(&buffer, width, height)?;
    }

    let mut buffer = rotate_image(&buffer, spec.rotation_degrees);

    if spec.opacity < 100 {
        let opacity = spec.opacity as u32;
        for pixel in buffer.pixels_mut() {
            pixel[3] = (pixel[3] as u32 * opacity / 100) as u8;
        }
    }

    Ok(buffer)
}
