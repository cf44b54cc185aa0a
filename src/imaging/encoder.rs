//! Image encoder abstraction
//!
//! One encoder per output format behind a common trait, so the save path
//! does not branch on format itself.

use std::io::Cursor;

use image::{codecs, ColorType, ImageEncoder as _};

use super::error::ImageError;
use super::format::OutputFormat;

/// Default quality used when the caller does not specify one
pub const DEFAULT_QUALITY: u8 = 95;

/// Encoder quality, 1-100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
        }
    }
}

impl EncoderQuality {
    /// Out-of-range values are clamped into 1..=100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Encodes raw pixels into one output format.
///
/// Implementations take raw RGBA8 pixels (4 bytes per pixel, row-major)
/// and return the encoded file bytes.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<Vec<u8>, ImageError>;
}

/// JPEG encoder; drops alpha and honours quality
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<Vec<u8>, ImageError> {
        let rgb = rgba_to_rgb(data);
        encode_to_vec(self.format(), |out| {
            codecs::jpeg::JpegEncoder::new_with_quality(out, quality.quality)
                .write_image(&rgb, width, height, ColorType::Rgb8)
        })
    }
}

pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, data: &[u8], width: u32, height: u32, _: EncoderQuality) -> Result<Vec<u8>, ImageError> {
        encode_to_vec(self.format(), |out| {
            codecs::png::PngEncoder::new(out).write_image(data, width, height, ColorType::Rgba8)
        })
    }
}

pub struct BmpEncoder;

impl ImageEncoder for BmpEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Bmp
    }

    fn encode(&self, data: &[u8], width: u32, height: u32, _: EncoderQuality) -> Result<Vec<u8>, ImageError> {
        encode_to_vec(self.format(), |out| {
            codecs::bmp::BmpEncoder::new(out).write_image(data, width, height, ColorType::Rgba8)
        })
    }
}

pub struct TiffEncoder;

impl ImageEncoder for TiffEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Tiff
    }

    fn encode(&self, data: &[u8], width: u32, height: u32, _: EncoderQuality) -> Result<Vec<u8>, ImageError> {
        encode_to_vec(self.format(), |out| {
            codecs::tiff::TiffEncoder::new(out).write_image(data, width, height, ColorType::Rgba8)
        })
    }
}

/// The `image` crate only writes lossless WebP, so quality is ignored.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, data: &[u8], width: u32, height: u32, _: EncoderQuality) -> Result<Vec<u8>, ImageError> {
        encode_to_vec(self.format(), |out| {
            codecs::webp::WebPEncoder::new_lossless(out)
                .write_image(data, width, height, ColorType::Rgba8)
        })
    }
}

/// Run `write` against an in-memory buffer and return the bytes.
fn encode_to_vec<F>(format: OutputFormat, write: F) -> Result<Vec<u8>, ImageError>
where
    F: FnOnce(&mut Cursor<Vec<u8>>) -> image::ImageResult<()>,
{
    let mut out = Cursor::new(Vec::new());
    write(&mut out).map_err(|e| ImageError::encode_failed(format.as_str(), e.to_string()))?;
    Ok(out.into_inner())
}

/// Picks the encoder for an output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::Bmp => Box::new(BmpEncoder),
            OutputFormat::Tiff => Box::new(TiffEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}

/// JPEG has no alpha channel; keep the colour bytes as they are.
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4).flat_map(|px| &px[..3]).copied().collect()
}
