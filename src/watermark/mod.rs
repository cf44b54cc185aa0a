//! Text and image watermarks for photographs.
//!
//! # Features
//!
//! - **Text watermarks** in any installed font, with optional drop shadow
//!   and stroke, falling back to a built-in font when nothing else loads
//! - **Image watermarks** from any decodable file, scaled with Lanczos3
//! - **9-grid anchors** or explicit pixel offsets
//! - **Rotation** with canvas expansion, **opacity**, and **tiling**
//! - **Templates**: named JSON files holding a watermark spec
//!
//! # Example
//!
//! ```yaml
//! type: text
//! text: "© Studio"
//! font_size: 36
//! font_color: "#FFFFFF"
//! has_stroke: true
//! position: bottom-right
//! opacity: 60
//! ```

pub mod compositor;
pub mod error;
pub mod position;
pub mod processor;
pub mod renderer;
pub mod rotate;
pub mod spec;
pub mod template;

// Re-export main types for convenience
pub use compositor::{composite, composite_in_place, RenderedWatermark, WatermarkLayer};
pub use error::WatermarkError;
pub use position::{
    calculate_position, calculate_tiled_positions, resolve_position, Dimensions,
    PlacementPosition, DEFAULT_MARGIN,
};
pub use processor::Watermarker;
pub use renderer::WatermarkRenderer;
pub use rotate::rotate_image;
pub use spec::{
    parse_hex_color, Anchor, ImageWatermark, Position, RgbColor, TextWatermark, WatermarkKind,
    WatermarkSpec,
};
pub use template::{TemplateError, TemplateInfo, TemplateStore, WatermarkTemplate};
