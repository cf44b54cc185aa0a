//! Raster image I/O for the watermark pipeline
//!
//! Provides:
//! - `Canvas`, the RGBA buffer every photograph is normalised to
//! - Input format checks (JPEG, PNG, BMP, TIFF) and output format selection
//! - Quality-aware encoders (PNG, JPEG, BMP, TIFF, lossless WebP)
//! - Lanczos3 resizing by percentage, exact size or single-axis aspect fit

pub mod canvas;
pub mod encoder;
pub mod error;
pub mod format;
pub mod processor;

pub use canvas::Canvas;
pub use encoder::{EncoderFactory, EncoderQuality, ImageEncoder, DEFAULT_QUALITY};
pub use error::ImageError;
pub use format::{is_supported_format, OutputFormat, SUPPORTED_EXTENSIONS};
pub use processor::{
    load_canvas, load_rgba, resize_canvas, resize_rgba, save_canvas, ResizeSpec,
};
