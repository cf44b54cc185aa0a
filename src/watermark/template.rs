//! Watermark template files.
//!
//! A template is a JSON file holding one `WatermarkSpec` plus a name,
//! description and creation time. `TemplateStore` manages a directory of
//! them; names never collide, a clash gets a `_1`, `_2`, ... suffix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::spec::WatermarkSpec;

pub const TEMPLATE_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template name '{0}' is not a valid file name")]
    InvalidName(String),

    #[error("template '{0}' not found")]
    NotFound(String),

    #[error("template I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed template {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TemplateError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A stored watermark with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub watermark: WatermarkSpec,
}

impl WatermarkTemplate {
    pub fn new(name: impl Into<String>, description: impl Into<String>, watermark: WatermarkSpec) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            watermark,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Listing entry for a stored template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateInfo {
    /// File stem, used to load the template
    pub name: String,
    /// Name recorded inside the file
    pub display_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}

/// Directory of template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Open a store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TemplateError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `spec` under `name`, or a suffixed variant if the name is taken.
    ///
    /// Returns the name actually used.
    pub fn save(
        &self,
        name: &str,
        spec: &WatermarkSpec,
        description: &str,
    ) -> Result<String, TemplateError> {
        let base = validate_name(name)?;
        let stored = self.unique_name(base);
        let template = WatermarkTemplate::new(stored.clone(), description, spec.clone());
        self.write(&template)?;
        tracing::info!(template = %stored, "Template saved");
        Ok(stored)
    }

    /// Load a template by name, with or without the `.json` extension.
    pub fn load(&self, name: &str) -> Result<WatermarkTemplate, TemplateError> {
        let path = self.existing_path(name)?;
        read_template(&path)
    }

    /// All readable templates, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<TemplateInfo>, TemplateError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TemplateError::io(&self.dir, e)),
        };

        let mut templates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match read_template(&path) {
                Ok(template) => templates.push(TemplateInfo {
                    name: stem.to_string(),
                    display_name: template.name,
                    description: template.description,
                    created_at: template.created_at,
                    path,
                }),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable template"),
            }
        }

        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    pub fn delete(&self, name: &str) -> Result<(), TemplateError> {
        let path = self.existing_path(name)?;
        fs::remove_file(&path).map_err(|e| TemplateError::io(&path, e))?;
        tracing::info!(template = name, "Template deleted");
        Ok(())
    }

    /// Rename a template, rewriting the name stored inside it.
    ///
    /// Returns the name actually used, which carries a suffix if
    /// `new_name` was taken.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<String, TemplateError> {
        let old_path = self.existing_path(old_name)?;
        let base = validate_name(new_name)?;
        if self.path_for(base) == old_path {
            return Ok(base.to_string());
        }

        let mut template = read_template(&old_path)?;
        let stored = self.unique_name(base);
        template.name = stored.clone();
        self.write(&template)?;
        fs::remove_file(&old_path).map_err(|e| TemplateError::io(&old_path, e))?;

        tracing::info!(from = old_name, to = %stored, "Template renamed");
        Ok(stored)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, TEMPLATE_EXTENSION))
    }

    fn existing_path(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let stem = name
            .strip_suffix(&format!(".{}", TEMPLATE_EXTENSION))
            .unwrap_or(name);
        let stem = validate_name(stem)?;
        let path = self.path_for(stem);
        if path.is_file() {
            Ok(path)
        } else {
            Err(TemplateError::NotFound(name.to_string()))
        }
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.path_for(base).exists() {
            return base.to_string();
        }
        (1u32..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.path_for(candidate).exists())
            .unwrap_or_else(|| base.to_string())
    }

    fn write(&self, template: &WatermarkTemplate) -> Result<(), TemplateError> {
        let path = self.path_for(&template.name);
        let json = template.to_json().map_err(|source| TemplateError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|e| TemplateError::io(&path, e))
    }
}

fn validate_name(name: &str) -> Result<&str, TemplateError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0'])
    {
        return Err(TemplateError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

fn read_template(path: &Path) -> Result<WatermarkTemplate, TemplateError> {
    let json = fs::read_to_string(path).map_err(|e| TemplateError::io(path, e))?;
    WatermarkTemplate::from_json(&json).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
