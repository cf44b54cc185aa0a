//! Imaging error types
//!
//! Structured errors for loading, resizing, encoding and saving images.
//! Every variant carries enough context (path or format plus message) to
//! be shown to a user as-is.

use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur while reading, transforming or writing images
#[derive(Debug, Clone)]
pub enum ImageError {
    // === Decoding Errors ===
    /// File extension is not one of the supported raster formats
    UnsupportedFormat { format: String },
    /// File exists but is not a valid image
    DecodeFailed { message: String },

    // === Processing Errors ===
    /// Resize operation failed
    ResizeFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
    /// Requested dimensions are invalid
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    // === I/O Errors ===
    /// Missing or unwritable path
    Io { path: PathBuf, message: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            ImageError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            ImageError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            ImageError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            ImageError::InvalidDimensions {
                width,
                height,
                reason,
            } => {
                write!(f, "Invalid dimensions {}x{}: {}", width, height, reason)
            }
            ImageError::Io { path, message } => {
                write!(f, "I/O error on {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl ImageError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        ImageError::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, err: impl fmt::Display) -> Self {
        ImageError::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Whether the error comes from the caller's input rather than from
    /// the environment (disk, permissions).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImageError::UnsupportedFormat { .. }
                | ImageError::DecodeFailed { .. }
                | ImageError::InvalidDimensions { .. }
        )
    }
}
