// Photomark watermarking library

pub mod batch;
pub mod config;
pub mod error;
pub mod font;
pub mod imaging;
pub mod logging;
pub mod watermark;

pub use error::{Error, Result};
