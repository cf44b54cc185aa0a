//! Watermark error types.
//!
//! Defines errors that can occur while validating, rendering and applying
//! watermarks. Font problems never appear here: font resolution degrades
//! to the built-in bitmap font instead of failing.

use std::fmt;
use std::path::PathBuf;

use crate::imaging::ImageError;

/// Errors that can occur during watermark processing.
#[derive(Debug)]
pub enum WatermarkError {
    /// Watermark spec failed validation
    InvalidSpec(String),

    /// Watermark image could not be loaded
    SourceImage { path: PathBuf, source: ImageError },

    /// Rendering produced an unusable buffer
    RenderError(String),

    /// Loading, resizing or saving the target image failed
    Image(ImageError),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpec(msg) => write!(f, "Invalid watermark: {}", msg),
            Self::SourceImage { path, source } => write!(
                f,
                "Failed to load watermark image {}: {}",
                path.display(),
                source
            ),
            Self::RenderError(msg) => write!(f, "Failed to render watermark: {}", msg),
            Self::Image(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for WatermarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SourceImage { source, .. } => Some(source),
            Self::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ImageError> for WatermarkError {
    fn from(err: ImageError) -> Self {
        Self::Image(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = WatermarkError::InvalidSpec("opacity must be 0-100".to_string());
        assert_eq!(err.to_string(), "Invalid watermark: opacity must be 0-100");

        let err = WatermarkError::SourceImage {
            path: PathBuf::from("/logos/mark.png"),
            source: ImageError::decode_failed("bad header"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load watermark image /logos/mark.png: Failed to decode image: bad header"
        );

        let err = WatermarkError::RenderError("empty buffer".to_string());
        assert_eq!(err.to_string(), "Failed to render watermark: empty buffer");
    }

    #[test]
    fn test_image_error_passes_through() {
        let err: WatermarkError = ImageError::unsupported_format("gif").into();
        assert_eq!(err.to_string(), "Unsupported image format: gif");
        assert!(err.source().is_some());
    }
}
