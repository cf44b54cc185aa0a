//! Watermark compositor for blending rendered watermarks onto canvases.
//!
//! Compositing never touches the caller's canvas: `composite` copies it
//! first and draws on the copy. Layers that extend past the canvas are
//! clipped; tiles are drawn in generation order so overlaps accumulate.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::position::PlacementPosition;
use crate::imaging::Canvas;

/// A rendered watermark buffer placed at a position.
#[derive(Clone)]
pub struct WatermarkLayer {
    pub image: Arc<RgbaImage>,
    pub position: PlacementPosition,
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .finish()
    }
}

/// Output of the renderer: nothing, one placement, or one tile repeated.
#[derive(Debug, Clone)]
pub enum RenderedWatermark {
    /// Nothing to draw (empty text, zero-sized buffer)
    Empty,
    Single(WatermarkLayer),
    Tiled {
        tile: Arc<RgbaImage>,
        placements: Vec<PlacementPosition>,
    },
}

impl RenderedWatermark {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Single(_) => false,
            Self::Tiled { placements, .. } => placements.is_empty(),
        }
    }

    /// Number of placements that will be drawn
    pub fn placement_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Tiled { placements, .. } => placements.len(),
        }
    }

    /// Layers in drawing order
    pub fn layers(&self) -> Vec<WatermarkLayer> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(layer) => vec![layer.clone()],
            Self::Tiled { tile, placements } => placements
                .iter()
                .map(|position| WatermarkLayer {
                    image: Arc::clone(tile),
                    position: *position,
                })
                .collect(),
        }
    }
}

/// Composite a rendered watermark onto a copy of `canvas`.
pub fn composite(canvas: &Canvas, rendered: &RenderedWatermark) -> Canvas {
    let mut output = canvas.clone();
    composite_in_place(output.as_rgba_mut(), rendered);
    output
}

/// Composite a rendered watermark directly onto `target`.
pub fn composite_in_place(target: &mut RgbaImage, rendered: &RenderedWatermark) {
    match rendered {
        RenderedWatermark::Empty => {}
        RenderedWatermark::Single(layer) => blend_layer(target, &layer.image, layer.position),
        RenderedWatermark::Tiled { tile, placements } => {
            for position in placements {
                blend_layer(target, tile, *position);
            }
        }
    }
}

/// Blend one buffer onto the target at `position`, clipping to bounds.
fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, position: PlacementPosition) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;
    let (px, py) = (position.x as i64, position.y as i64);

    // Visible region
    let x_start = px.max(0);
    let y_start = py.max(0);
    let x_end = (px + layer.width() as i64).min(target_width);
    let y_end = (py + layer.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wm_pixel = layer.get_pixel((tx - px) as u32, (ty - py) as u32);
            if wm_pixel[3] == 0 {
                continue;
            }
            let target_pixel = target.get_pixel_mut(tx as u32, ty as u32);
            *target_pixel = blend_pixels(*target_pixel, *wm_pixel);
        }
    }
}

/// Porter-Duff "over": result = foreground + background * (1 - foreground.alpha)
pub(crate) fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result = (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
