// Error types module

use thiserror::Error;

use crate::batch::BatchError;
use crate::font::FontError;
use crate::imaging::ImageError;
use crate::watermark::{TemplateError, WatermarkError};

/// Crate-level error aggregating the module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error was caused by the input rather than the
    /// environment, so a caller can skip the item and carry on.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::Image(e) => e.is_input_error(),
            Error::Watermark(WatermarkError::Image(e))
            | Error::Watermark(WatermarkError::SourceImage { source: e, .. }) => {
                e.is_input_error()
            }
            Error::Watermark(WatermarkError::InvalidSpec(_)) => true,
            Error::Template(TemplateError::InvalidName(_)) => true,
            _ => false,
        }
    }
}
