//! Batch jobs and output naming.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::imaging::{OutputFormat, ResizeSpec, DEFAULT_QUALITY};
use crate::watermark::WatermarkSpec;

/// Appended to the file stem when writing next to the source image.
pub const SAME_DIR_SUFFIX: &str = "_watermarked";

/// One image to watermark. Immutable once queued.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub spec: Arc<WatermarkSpec>,
    pub output_format: OutputFormat,
    /// 1-100, only used by lossy formats
    pub quality: u8,
    pub rename_prefix: String,
    pub rename_suffix: String,
    pub resize: ResizeSpec,
}

impl BatchJob {
    /// `{prefix}{stem}{suffix}{ext}` inside the output directory.
    ///
    /// When the output directory is the source's own directory,
    /// `_watermarked` goes before the extension so the original survives.
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut file_name = format!("{}{}{}", self.rename_prefix, stem, self.rename_suffix);
        if self.writes_into_source_dir() {
            file_name.push_str(SAME_DIR_SUFFIX);
        }
        file_name.push_str(self.output_format.extension());

        self.output_dir.join(file_name)
    }

    fn writes_into_source_dir(&self) -> bool {
        let source_dir = match self.source_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        same_directory(&self.output_dir, source_dir)
    }
}

/// Compare directories by canonical path, falling back to a lexical
/// comparison when either does not exist.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => normalize(a) == normalize(b),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Settings shared by every job of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub quality: u8,
    pub rename_prefix: String,
    pub rename_suffix: String,
    pub resize: ResizeSpec,
}

impl BatchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            rename_prefix: String::new(),
            rename_suffix: String::new(),
            resize: ResizeSpec::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_rename(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.rename_prefix = prefix.into();
        self.rename_suffix = suffix.into();
        self
    }

    pub fn with_resize(mut self, resize: ResizeSpec) -> Self {
        self.resize = resize;
        self
    }

    /// One job per source path, in order, all sharing `spec`.
    pub fn jobs<I, P>(&self, sources: I, spec: &WatermarkSpec) -> Vec<BatchJob>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let spec = Arc::new(spec.clone());
        sources
            .into_iter()
            .map(|source| BatchJob {
                source_path: source.into(),
                output_dir: self.output_dir.clone(),
                spec: Arc::clone(&spec),
                output_format: self.output_format,
                quality: self.quality,
                rename_prefix: self.rename_prefix.clone(),
                rename_suffix: self.rename_suffix.clone(),
                resize: self.resize,
            })
            .collect()
    }
}
