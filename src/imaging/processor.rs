//! Image loading, resizing and saving
//!
//! Handles the file side of the pipeline: read → decode → canvas, and
//! canvas → resize → encode → write.

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::num::NonZeroU32;
use std::path::Path;

use super::canvas::Canvas;
use super::encoder::{EncoderFactory, EncoderQuality};
use super::error::ImageError;
use super::format::{is_supported_format, lowercase_extension, OutputFormat};

/// Optional output resize
///
/// A percentage scales both axes and wins over explicit sizes. Width and
/// height together force an exact size; either one alone keeps the aspect
/// ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResizeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f32>,
}

impl ResizeSpec {
    pub fn percentage(percentage: f32) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::default()
        }
    }

    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            percentage: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.percentage.is_none()
    }

    /// Target dimensions for a source of `src_width` x `src_height`
    pub fn target_dimensions(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        let (w, h) = if let Some(pct) = self.percentage {
            (
                scale_floor(src_width, pct as f64 / 100.0),
                scale_floor(src_height, pct as f64 / 100.0),
            )
        } else {
            match (self.width, self.height) {
                (Some(w), Some(h)) => (w, h),
                (Some(w), None) if src_width > 0 => {
                    (w, scale_floor(src_height, w as f64 / src_width as f64))
                }
                (None, Some(h)) if src_height > 0 => {
                    (scale_floor(src_width, h as f64 / src_height as f64), h)
                }
                _ => (src_width, src_height),
            }
        };
        (w.max(1), h.max(1))
    }

    pub fn validate(&self) -> Result<(), ImageError> {
        if let Some(pct) = self.percentage {
            if !pct.is_finite() || pct <= 0.0 {
                return Err(ImageError::invalid_dimensions(
                    self.width.unwrap_or(0),
                    self.height.unwrap_or(0),
                    format!("resize percentage must be positive, got {}", pct),
                ));
            }
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ImageError::invalid_dimensions(
                self.width.unwrap_or(0),
                self.height.unwrap_or(0),
                "resize dimensions must be non-zero",
            ));
        }
        Ok(())
    }
}

fn scale_floor(value: u32, factor: f64) -> u32 {
    (value as f64 * factor).floor() as u32
}

/// Load a photograph from disk as a canvas
///
/// Only the supported photograph extensions are accepted.
pub fn load_canvas(path: &Path) -> Result<Canvas, ImageError> {
    if !is_supported_format(path) {
        return Err(ImageError::unsupported_format(
            lowercase_extension(path).unwrap_or_else(|| path.display().to_string()),
        ));
    }
    Ok(Canvas::from_dynamic(decode_file(path)?))
}

/// Load any decodable image file as RGBA, regardless of extension
pub fn load_rgba(path: &Path) -> Result<RgbaImage, ImageError> {
    Ok(decode_file(path)?.into_rgba8())
}

fn decode_file(path: &Path) -> Result<DynamicImage, ImageError> {
    let data = std::fs::read(path).map_err(|e| ImageError::io(path, e))?;
    decode_image(&data)
}

/// Decode image data into a DynamicImage
fn decode_image(data: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

/// Apply a resize spec to a canvas, returning it unchanged when no resize
/// is requested or the size already matches
pub fn resize_canvas(canvas: Canvas, resize: &ResizeSpec) -> Result<Canvas, ImageError> {
    if resize.is_noop() {
        return Ok(canvas);
    }
    resize.validate()?;
    let (src_w, src_h) = canvas.dimensions();
    let (target_w, target_h) = resize.target_dimensions(src_w, src_h);
    if (target_w, target_h) == (src_w, src_h) {
        return Ok(canvas);
    }
    Ok(Canvas::from_rgba(resize_rgba(
        canvas.as_rgba(),
        target_w,
        target_h,
    )?))
}

/// Resize RGBA pixels using fast-image-resize with Lanczos3 filter
///
/// Pixels are premultiplied for the convolution, so colour under fully
/// transparent pixels never bleeds into visible edges.
pub fn resize_rgba(img: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage, ImageError> {
    let (src_w, src_h) = img.dimensions();

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let mut src_image =
        Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x4)
            .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let alpha = MulDiv::default();
    alpha
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Failed to premultiply alpha: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut dst_view = dst_image.view_mut();

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_view)
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    alpha
        .divide_alpha_inplace(&mut dst_view)
        .map_err(|e| ImageError::resize_failed(format!("Failed to restore alpha: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))
}

/// Encode a canvas and write it to `path`
pub fn save_canvas(
    canvas: &Canvas,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<(), ImageError> {
    let (width, height) = canvas.dimensions();
    let encoded = EncoderFactory::create(format).encode(
        canvas.as_rgba().as_raw(),
        width,
        height,
        EncoderQuality::with_quality(quality),
    )?;
    std::fs::write(path, encoded).map_err(|e| ImageError::io(path, e))?;
    tracing::debug!(
        path = %path.display(),
        format = %format,
        width,
        height,
        "Image saved"
    );
    Ok(())
}
