//! Rotation with bounding-box expansion.

use image::{Rgba, RgbaImage};

/// Slack for float noise at right angles, so a 90° turn of a 4x2 buffer is
/// 2x4 and not 3x5.
const EXTENT_EPSILON: f32 = 1e-3;

/// Rotate an image counter-clockwise by `degrees`.
///
/// The output grows to the rotated bounding box so no content is cropped.
/// Sampling is bilinear over premultiplied alpha; samples falling outside
/// the source read as transparent.
pub fn rotate_image(image: &RgbaImage, degrees: f32) -> RgbaImage {
    if degrees == 0.0 || !degrees.is_finite() || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let radians = degrees.to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    // Forward transform (y points down, so CCW is x' = x·cos + y·sin)
    let corners = [(-cx, -cy), (cx, -cy), (-cx, cy), (cx, cy)];
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::INFINITY,
        f32::NEG_INFINITY,
    );
    for (x, y) in corners {
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let dst_w = ((max_x - min_x - EXTENT_EPSILON).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y - EXTENT_EPSILON).ceil() as u32).max(1);
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    let mut rotated = RgbaImage::new(dst_w, dst_h);

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            // Inverse transform from the destination pixel center
            let rx = dx as f32 + 0.5 - dst_cx;
            let ry = dy as f32 + 0.5 - dst_cy;
            let sx = rx * cos - ry * sin + cx - 0.5;
            let sy = rx * sin + ry * cos + cy - 0.5;

            if let Some(pixel) = sample_bilinear(image, sx, sy) {
                rotated.put_pixel(dx, dy, pixel);
            }
        }
    }

    rotated
}

/// Bilinear sample at fractional source coordinates, or `None` when all
/// four neighbours are outside the image.
fn sample_bilinear(image: &RgbaImage, sx: f32, sy: f32) -> Option<Rgba<u8>> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let (w, h) = (image.width() as i64, image.height() as i64);
    if x0 + 1 < 0 || y0 + 1 < 0 || x0 >= w || y0 >= h {
        return None;
    }

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut premul = [0.0f32; 3];
    let mut alpha = 0.0f32;
    for (x, y, weight) in taps {
        if x < 0 || y < 0 || x >= w || y >= h || weight <= 0.0 {
            continue;
        }
        let p = image.get_pixel(x as u32, y as u32);
        let a = p[3] as f32 * weight;
        premul[0] += p[0] as f32 * a;
        premul[1] += p[1] as f32 * a;
        premul[2] += p[2] as f32 * a;
        alpha += a;
    }

    if alpha < 0.5 {
        return None;
    }

    let channel = |v: f32| (v / alpha).round().clamp(0.0, 255.0) as u8;
    Some(Rgba([
        channel(premul[0]),
        channel(premul[1]),
        channel(premul[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ]))
}
