//! Position calculation for watermark placement.
//!
//! - **Anchors**: the 9-grid of named positions, inset by a margin
//! - **Points**: explicit offsets, returned unchanged
//! - **Tiles**: a grid of origins starting at (0, 0) and stepping by the
//!   tile size plus spacing until the origin leaves the canvas
//!
//! # Example
//!
//! ```
//! use photomark::watermark::position::{resolve_position, Dimensions, DEFAULT_MARGIN};
//! use photomark::watermark::{Anchor, Position};
//!
//! let canvas = Dimensions::new(500, 300);
//! let watermark = Dimensions::new(100, 40);
//!
//! let placement = resolve_position(
//!     &Position::Anchor(Anchor::BottomRight),
//!     canvas,
//!     watermark,
//!     DEFAULT_MARGIN,
//! );
//! assert_eq!((placement.x, placement.y), (390, 250)); // 500 - 100 - 10, 300 - 40 - 10
//! ```

use super::spec::{Anchor, Position};

/// Inset from the canvas edge for anchored placements.
pub const DEFAULT_MARGIN: u32 = 10;

/// Width and height of a canvas or watermark buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left offset where a watermark is drawn. May be negative or past the
/// canvas edge; compositing clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Resolve an anchor or explicit point to a top-left offset.
pub fn resolve_position(
    position: &Position,
    canvas: Dimensions,
    watermark: Dimensions,
    margin: u32,
) -> PlacementPosition {
    match position {
        Position::Point(x, y) => PlacementPosition::new(*x, *y),
        Position::Anchor(anchor) => calculate_position(*anchor, canvas, watermark, margin),
    }
}

/// Calculate the offset for one of the nine anchors.
///
/// Centered axes split the free space evenly, rounding toward zero. The
/// result is negative when the watermark is larger than the canvas.
pub fn calculate_position(
    anchor: Anchor,
    canvas: Dimensions,
    watermark: Dimensions,
    margin: u32,
) -> PlacementPosition {
    let img_w = canvas.width as i32;
    let img_h = canvas.height as i32;
    let wm_w = watermark.width as i32;
    let wm_h = watermark.height as i32;
    let m = margin as i32;

    let left = m;
    let center_x = (img_w - wm_w) / 2;
    let right = img_w - wm_w - m;
    let top = m;
    let center_y = (img_h - wm_h) / 2;
    let bottom = img_h - wm_h - m;

    match anchor {
        // Top row
        Anchor::TopLeft => PlacementPosition::new(left, top),
        Anchor::TopCenter => PlacementPosition::new(center_x, top),
        Anchor::TopRight => PlacementPosition::new(right, top),

        // Center row
        Anchor::CenterLeft => PlacementPosition::new(left, center_y),
        Anchor::Center => PlacementPosition::new(center_x, center_y),
        Anchor::CenterRight => PlacementPosition::new(right, center_y),

        // Bottom row
        Anchor::BottomLeft => PlacementPosition::new(left, bottom),
        Anchor::BottomCenter => PlacementPosition::new(center_x, bottom),
        Anchor::BottomRight => PlacementPosition::new(right, bottom),
    }
}

/// Calculate origins for tiled placement, row by row.
///
/// Tiles whose origin is inside the canvas are kept even if they run past
/// the far edge.
pub fn calculate_tiled_positions(
    canvas: Dimensions,
    tile: Dimensions,
    spacing: u32,
) -> Vec<PlacementPosition> {
    let mut positions = Vec::new();

    let step_x = (tile.width.saturating_add(spacing)).max(1) as i64;
    let step_y = (tile.height.saturating_add(spacing)).max(1) as i64;

    let mut y = 0i64;
    while y < canvas.height as i64 {
        let mut x = 0i64;
        while x < canvas.width as i64 {
            positions.push(PlacementPosition::new(x as i32, y as i32));
            x += step_x;
        }
        y += step_y;
    }

    positions
}
