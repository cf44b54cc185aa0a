//! Font resolution with a deterministic fallback chain.
//!
//! A [`FontRegistry`] turns an optional font name (family name or file path)
//! and a pixel size into a [`FontHandle`]. Resolution never fails: when every
//! real font source is exhausted the built-in bitmap font is returned and the
//! handle reports itself as degraded.
//!
//! # Fallback order
//!
//! 1. `name` is an absolute path to an existing file: load it.
//! 2. `name` is an installed system family (or a relative font file path).
//! 3. The first loadable file in the configured local fonts directory.
//! 4. The first installed family from the configured CJK-capable list.
//! 5. The built-in bitmap font.
//!
//! Every resolution is cached by `(name, size)`; handles are immutable and
//! shared through `Arc`, so one registry can serve concurrent renders.

pub mod bitmap;

use ab_glyph::{point, Font, FontArc, FontVec, PxScale, ScaleFont};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// File extensions considered when scanning the local fonts directory.
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "ttc", "otf", "woff", "woff2"];

/// CJK-capable families tried, in order, after the local fonts directory.
pub const DEFAULT_FALLBACK_FAMILIES: &[&str] = &[
    // Windows
    "SimHei",
    "Microsoft YaHei",
    "FangSong",
    "KaiTi",
    "NSimSun",
    // macOS
    "Heiti TC",
    "STHeiti",
    "STKaiti",
    "STSong",
    "PingFang SC",
    "Hiragino Sans GB",
    // Linux
    "WenQuanYi Micro Hei",
    "WenQuanYi Zen Hei",
    "Noto Sans SC",
    "Noto Serif SC",
    // Generic
    "Arial Unicode MS",
    "SimSun",
];

/// Why a single fallback step could not produce a font.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a usable font face: {0}")]
    InvalidFont(String),

    #[error("font family '{0}' is not installed")]
    NotInstalled(String),

    #[error("no loadable font in {0}")]
    NoLocalFonts(PathBuf),

    #[error("none of the fallback families is installed")]
    NoFallbackFamily,

    #[error("system font lookup is disabled")]
    SystemFontsDisabled,
}

/// Where a resolved font came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// Loaded from an explicit file path.
    File(PathBuf),
    /// Installed system family, looked up by name.
    System(String),
    /// First loadable file of the local fonts directory.
    LocalDir(PathBuf),
    /// Entry of the fallback family list.
    Fallback(String),
    /// Built-in bitmap font.
    Builtin,
}

#[derive(Clone)]
enum Face {
    Outline(FontArc),
    Bitmap,
}

/// A renderable font at a fixed pixel size.
///
/// Handles are never mutated after creation.
#[derive(Clone)]
pub struct FontHandle {
    face: Face,
    size: u32,
    source: FontSource,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("size", &self.size)
            .field("source", &self.source)
            .finish()
    }
}

impl FontHandle {
    fn outline(font: FontArc, size: u32, source: FontSource) -> Self {
        Self {
            face: Face::Outline(font),
            size,
            source,
        }
    }

    /// The built-in bitmap font at `size`.
    pub fn builtin(size: u32) -> Self {
        Self {
            face: Face::Bitmap,
            size: size.max(1),
            source: FontSource::Builtin,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// True for the bitmap fallback, which cannot draw non-Latin text.
    pub fn is_degraded(&self) -> bool {
        matches!(self.face, Face::Bitmap)
    }

    /// Whether every character of `text` maps to a real glyph.
    pub fn covers(&self, text: &str) -> bool {
        match &self.face {
            Face::Outline(font) => text
                .chars()
                .filter(|c| !c.is_whitespace())
                .all(|c| font.glyph_id(c).0 != 0),
            Face::Bitmap => text.chars().all(bitmap::has_glyph),
        }
    }

    /// Rendered (width, height) of `text` in whole pixels.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }

        match &self.face {
            Face::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(self.size as f32));
                let mut width = 0.0f32;
                let mut prev = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = prev {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                (width.ceil().max(0.0) as u32, scaled.height().ceil() as u32)
            }
            Face::Bitmap => bitmap::measure(text, bitmap::scale_for_size(self.size)),
        }
    }

    /// Visit the coverage (0.0 to 1.0) of every touched pixel when `text`
    /// is laid out with its top-left corner at `(x, y)`.
    pub fn rasterize(&self, text: &str, x: i32, y: i32, mut f: impl FnMut(i32, i32, f32)) {
        match &self.face {
            Face::Outline(font) => {
                let scale = PxScale::from(self.size as f32);
                let scaled = font.as_scaled(scale);
                let baseline = y as f32 + scaled.ascent();
                let mut cursor = x as f32;
                let mut prev = None;

                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = prev {
                        cursor += scaled.kern(prev, id);
                    }

                    let glyph = id.with_scale_and_position(scale, point(cursor, baseline));
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|px, py, coverage| {
                            f(
                                px as i32 + bounds.min.x as i32,
                                py as i32 + bounds.min.y as i32,
                                coverage,
                            );
                        });
                    }

                    cursor += scaled.h_advance(id);
                    prev = Some(id);
                }
            }
            Face::Bitmap => {
                let scale = bitmap::scale_for_size(self.size);
                bitmap::for_each_pixel(text, scale, |px, py| {
                    f(x + px as i32, y + py as i32, 1.0);
                });
            }
        }
    }
}

/// Settings for the font fallback chain.
#[derive(Debug, Clone)]
pub struct FontRegistryConfig {
    /// Directory scanned in step 3. `None` skips the step.
    pub local_dir: Option<PathBuf>,
    /// Families tried in step 4, in order.
    pub fallback_families: Vec<String>,
    /// Whether installed system fonts are consulted at all.
    pub system_fonts: bool,
    /// Optional bound on cached handles. `None` means unbounded.
    pub max_cached_fonts: Option<usize>,
}

impl Default for FontRegistryConfig {
    fn default() -> Self {
        Self {
            local_dir: Some(PathBuf::from("fonts")),
            fallback_families: DEFAULT_FALLBACK_FAMILIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            system_fonts: true,
            max_cached_fonts: None,
        }
    }
}

impl FontRegistryConfig {
    /// A configuration that only ever yields the built-in font, unless a
    /// font file is named explicitly.
    pub fn builtin_only() -> Self {
        Self {
            local_dir: None,
            fallback_families: Vec::new(),
            system_fonts: false,
            max_cached_fonts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    name: Option<String>,
    size: u32,
}

#[derive(Default)]
struct FontCache {
    entries: HashMap<FontKey, Arc<FontHandle>>,
    insertion_order: VecDeque<FontKey>,
}

/// Resolves and caches fonts. Construct once and share by reference.
pub struct FontRegistry {
    config: FontRegistryConfig,
    system_db: OnceLock<Option<fontdb::Database>>,
    cache: RwLock<FontCache>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("config", &self.config)
            .field("cached", &self.cached_count())
            .finish()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new(FontRegistryConfig::default())
    }
}

impl FontRegistry {
    pub fn new(config: FontRegistryConfig) -> Self {
        Self {
            config,
            system_db: OnceLock::new(),
            cache: RwLock::new(FontCache::default()),
        }
    }

    pub fn config(&self) -> &FontRegistryConfig {
        &self.config
    }

    /// Resolve a font for `name` at `size` pixels. Never fails.
    pub fn resolve(&self, name: Option<&str>, size: u32) -> Arc<FontHandle> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let key = FontKey {
            name: name.map(str::to_string),
            size,
        };

        if let Some(handle) = self.cache.read().entries.get(&key) {
            tracing::trace!(font = ?name, size, "font cache hit");
            return Arc::clone(handle);
        }

        let handle = Arc::new(self.load_uncached(name, size));
        self.insert(key, handle)
    }

    /// Number of cached `(name, size)` entries.
    pub fn cached_count(&self) -> usize {
        self.cache.read().entries.len()
    }

    /// Drop every cached handle.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        cache.entries.clear();
        cache.insertion_order.clear();
        tracing::debug!("font cache cleared");
    }

    fn insert(&self, key: FontKey, handle: Arc<FontHandle>) -> Arc<FontHandle> {
        let mut cache = self.cache.write();

        // Another thread may have resolved the same key meanwhile.
        if let Some(existing) = cache.entries.get(&key) {
            return Arc::clone(existing);
        }

        if let Some(max) = self.config.max_cached_fonts {
            while cache.entries.len() >= max.max(1) {
                match cache.insertion_order.pop_front() {
                    Some(oldest) => {
                        cache.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        cache.insertion_order.push_back(key.clone());
        cache.entries.insert(key, Arc::clone(&handle));
        handle
    }

    fn load_uncached(&self, name: Option<&str>, size: u32) -> FontHandle {
        let size = size.max(1);

        let resolved = match name {
            Some(name) => self
                .load_absolute_path(name, size)
                .or_else(|_| self.load_named(name, size))
                .or_else(|e| {
                    tracing::warn!(font = name, error = %e, "requested font unavailable, falling back");
                    self.load_local_dir(size)
                }),
            None => self.load_local_dir(size),
        }
        .or_else(|e| {
            tracing::debug!(error = %e, "no local font, trying fallback families");
            self.load_fallback_families(size)
        });

        match resolved {
            Ok(handle) => {
                tracing::info!(source = ?handle.source(), size, "font resolved");
                handle
            }
            Err(e) => {
                tracing::warn!(
                    font = ?name,
                    size,
                    error = %e,
                    "all font sources failed, using built-in bitmap font"
                );
                FontHandle::builtin(size)
            }
        }
    }

    fn load_absolute_path(&self, name: &str, size: u32) -> Result<FontHandle, FontError> {
        let path = Path::new(name);
        if !path.is_absolute() || !path.is_file() {
            return Err(FontError::NotInstalled(name.to_string()));
        }
        let font = load_font_file(path)?;
        Ok(FontHandle::outline(font, size, FontSource::File(path.to_path_buf())))
    }

    fn load_named(&self, name: &str, size: u32) -> Result<FontHandle, FontError> {
        match self.load_system_family(name) {
            Ok(font) => Ok(FontHandle::outline(
                font,
                size,
                FontSource::System(name.to_string()),
            )),
            Err(family_err) => {
                let path = Path::new(name);
                if has_font_extension(path) && path.is_file() {
                    let font = load_font_file(path)?;
                    return Ok(FontHandle::outline(
                        font,
                        size,
                        FontSource::File(path.to_path_buf()),
                    ));
                }
                Err(family_err)
            }
        }
    }

    fn load_local_dir(&self, size: u32) -> Result<FontHandle, FontError> {
        let dir = self
            .config
            .local_dir
            .as_deref()
            .ok_or_else(|| FontError::NoLocalFonts(PathBuf::new()))?;

        let entries = std::fs::read_dir(dir).map_err(|source| FontError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !has_font_extension(&path) {
                continue;
            }
            match load_font_file(&path) {
                Ok(font) => return Ok(FontHandle::outline(font, size, FontSource::LocalDir(path))),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping local font");
                }
            }
        }

        Err(FontError::NoLocalFonts(dir.to_path_buf()))
    }

    fn load_fallback_families(&self, size: u32) -> Result<FontHandle, FontError> {
        for family in &self.config.fallback_families {
            match self.load_system_family(family) {
                Ok(font) => {
                    return Ok(FontHandle::outline(
                        font,
                        size,
                        FontSource::Fallback(family.clone()),
                    ))
                }
                Err(e) => tracing::debug!(family = %family, error = %e, "fallback family unavailable"),
            }
        }
        Err(FontError::NoFallbackFamily)
    }

    fn load_system_family(&self, family: &str) -> Result<FontArc, FontError> {
        let db = self
            .system_db()
            .ok_or(FontError::SystemFontsDisabled)?;

        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            ..fontdb::Query::default()
        };
        let id = db
            .query(&query)
            .ok_or_else(|| FontError::NotInstalled(family.to_string()))?;

        db.with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
                .map(FontArc::new)
                .map_err(|e| FontError::InvalidFont(format!("{family}: {e}")))
        })
        .ok_or_else(|| FontError::NotInstalled(family.to_string()))?
    }

    fn system_db(&self) -> Option<&fontdb::Database> {
        self.system_db
            .get_or_init(|| {
                if !self.config.system_fonts {
                    return None;
                }
                let mut db = fontdb::Database::new();
                db.load_system_fonts();
                tracing::debug!(faces = db.len(), "system font database loaded");
                Some(db)
            })
            .as_ref()
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FONT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn load_font_file(path: &Path) -> Result<FontArc, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec_and_index(data, 0)
        .map(FontArc::new)
        .map_err(|e| FontError::InvalidFont(format!("{}: {e}", path.display())))
}
