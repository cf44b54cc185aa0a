//! Watermark specification types.
//!
//! A `WatermarkSpec` is either a text or an image watermark plus the
//! placement and appearance fields shared by both. It serialises to the
//! same JSON/YAML shape that template files use:
//!
//! ```yaml
//! type: text
//! text: "© 2024 Studio"
//! font_size: 36
//! font_color: "#FFFFFF"
//! has_shadow: true
//! position: bottom-right
//! rotation_degrees: 0
//! opacity: 50
//! tiled: false
//! tile_spacing: 50
//! ```
//!
//! Explicit coordinates are written as a two-element list: `position: [40, 25]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::WatermarkError;

// Default values
fn default_font_size() -> u32 {
    24
}

fn default_opacity() -> u8 {
    50
}

fn default_scale() -> f32 {
    1.0
}

fn default_tile_spacing() -> u32 {
    50
}

/// One of the nine named placements on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::CenterLeft => "center-left",
            Self::Center => "center",
            Self::CenterRight => "center-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Lenient lookup used for stored specs: unknown names fall back to
    /// bottom-right.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(anchor = name, "Unknown anchor, using bottom-right");
            Anchor::BottomRight
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Anchor::ALL
            .iter()
            .copied()
            .find(|anchor| anchor.as_str() == normalized)
            .ok_or_else(|| {
                WatermarkError::InvalidSpec(format!(
                    "unknown anchor '{}', expected one of: {}",
                    s,
                    Anchor::ALL.map(|a| a.as_str()).join(", ")
                ))
            })
    }
}

impl From<String> for Anchor {
    fn from(name: String) -> Self {
        Anchor::from_name(&name)
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.as_str().to_string()
    }
}

impl Serialize for Anchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Anchor::from)
    }
}

/// Where a watermark goes: a named anchor or an explicit top-left offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Anchor(Anchor),
    Point(i32, i32),
}

impl Default for Position {
    fn default() -> Self {
        Position::Anchor(Anchor::default())
    }
}

impl From<Anchor> for Position {
    fn from(anchor: Anchor) -> Self {
        Position::Anchor(anchor)
    }
}

impl FromStr for Position {
    type Err = WatermarkError;

    /// Accepts an anchor name or `x,y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((x, y)) = s.split_once(',') {
            let parse = |v: &str| {
                v.trim().parse::<i32>().map_err(|_| {
                    WatermarkError::InvalidSpec(format!("invalid coordinate in '{}'", s))
                })
            };
            return Ok(Position::Point(parse(x)?, parse(y)?));
        }
        s.parse::<Anchor>().map(Position::Anchor)
    }
}

/// RGB colour, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor::new(255, 255, 255);
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_color(s)
    }
}

impl Serialize for RgbColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        parse_hex_color(&hex).map_err(serde::de::Error::custom)
    }
}

/// Parse a hex color string (#RGB or #RRGGBB format).
pub fn parse_hex_color(hex: &str) -> Result<RgbColor, WatermarkError> {
    let invalid = || WatermarkError::InvalidSpec(format!("invalid hex color '{}'", hex));

    let digits = hex
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::InvalidSpec("Color must start with '#'".to_string()))?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };

    match digits.len() {
        // Double each component: 0xF -> 0xFF
        3 => Ok(RgbColor::new(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        6 => Ok(RgbColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        len => Err(WatermarkError::InvalidSpec(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            len
        ))),
    }
}

/// Text watermark content and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextWatermark {
    /// Text to draw; empty text renders nothing
    pub text: String,

    /// Font family name or absolute path to a font file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,

    /// Font size in pixels (default: 24)
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Text color (default: "#FFFFFF")
    #[serde(default)]
    pub font_color: RgbColor,

    #[serde(default)]
    pub has_shadow: bool,

    #[serde(default)]
    pub has_stroke: bool,
}

/// Image watermark source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageWatermark {
    /// Path to the watermark image
    pub source_path: PathBuf,

    /// Scale factor applied before rotation (default: 1.0)
    #[serde(default = "default_scale")]
    pub scale: f32,
}

/// Text or image watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatermarkKind {
    Text(TextWatermark),
    Image(ImageWatermark),
}

/// Complete description of one watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    #[serde(flatten)]
    pub kind: WatermarkKind,

    /// Anchor or explicit offset (default: bottom-right)
    #[serde(default)]
    pub position: Position,

    /// Counter-clockwise rotation in degrees
    #[serde(default)]
    pub rotation_degrees: f32,

    /// Opacity from 0 (invisible) to 100 (opaque) (default: 50)
    #[serde(default = "default_opacity")]
    pub opacity: u8,

    /// Repeat the watermark across the whole canvas
    #[serde(default)]
    pub tiled: bool,

    /// Gap between tiles in pixels (default: 50)
    #[serde(default = "default_tile_spacing")]
    pub tile_spacing: u32,
}

impl WatermarkSpec {
    fn with_kind(kind: WatermarkKind) -> Self {
        Self {
            kind,
            position: Position::default(),
            rotation_degrees: 0.0,
            opacity: default_opacity(),
            tiled: false,
            tile_spacing: default_tile_spacing(),
        }
    }

    /// Text watermark with default style
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(WatermarkKind::Text(TextWatermark {
            text: text.into(),
            font_name: None,
            font_size: default_font_size(),
            font_color: RgbColor::default(),
            has_shadow: false,
            has_stroke: false,
        }))
    }

    /// Image watermark at its natural size
    pub fn image(source_path: impl Into<PathBuf>) -> Self {
        Self::with_kind(WatermarkKind::Image(ImageWatermark {
            source_path: source_path.into(),
            scale: default_scale(),
        }))
    }

    pub fn with_position(mut self, position: impl Into<Position>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_tiling(mut self, spacing: u32) -> Self {
        self.tiled = true;
        self.tile_spacing = spacing;
        self
    }

    pub fn as_text(&self) -> Option<&TextWatermark> {
        match &self.kind {
            WatermarkKind::Text(text) => Some(text),
            WatermarkKind::Image(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextWatermark> {
        match &mut self.kind {
            WatermarkKind::Text(text) => Some(text),
            WatermarkKind::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageWatermark> {
        match &self.kind {
            WatermarkKind::Image(image) => Some(image),
            WatermarkKind::Text(_) => None,
        }
    }

    /// Opacity as an alpha multiplier in 0.0..=1.0
    pub fn alpha_factor(&self) -> f32 {
        self.opacity.min(100) as f32 / 100.0
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.opacity > 100 {
            return Err(WatermarkError::InvalidSpec(format!(
                "opacity must be between 0 and 100, got {}",
                self.opacity
            )));
        }
        if !self.rotation_degrees.is_finite() {
            return Err(WatermarkError::InvalidSpec(format!(
                "rotation must be a finite number of degrees, got {}",
                self.rotation_degrees
            )));
        }

        match &self.kind {
            WatermarkKind::Text(text) => {
                if text.font_size == 0 {
                    return Err(WatermarkError::InvalidSpec(
                        "font_size must be greater than 0".to_string(),
                    ));
                }
            }
            WatermarkKind::Image(image) => {
                if image.source_path.as_os_str().is_empty() {
                    return Err(WatermarkError::InvalidSpec(
                        "image watermark source_path cannot be empty".to_string(),
                    ));
                }
                if !image.scale.is_finite() || image.scale <= 0.0 {
                    return Err(WatermarkError::InvalidSpec(format!(
                        "scale must be a finite value greater than 0, got {}",
                        image.scale
                    )));
                }
            }
        }

        Ok(())
    }
}
