// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::font::{FontRegistryConfig, DEFAULT_FALLBACK_FAMILIES};
use crate::imaging::{OutputFormat, DEFAULT_QUALITY};

/// Application configuration. Every field has a default, so an empty
/// file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fonts: FontsConfig,
    pub output: OutputConfig,
    pub batch: BatchConfig,
    pub templates: TemplatesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// Directory searched for font files by stem (default: fonts)
    pub local_dir: Option<PathBuf>,
    /// Families tried when the requested font cannot be found
    pub fallback_families: Vec<String>,
    /// Consult installed system fonts (default: true)
    pub system_fonts: bool,
    /// Bound on cached font handles; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cached_fonts: Option<usize>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        let defaults = FontRegistryConfig::default();
        Self {
            local_dir: defaults.local_dir,
            fallback_families: DEFAULT_FALLBACK_FAMILIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            system_fonts: defaults.system_fonts,
            max_cached_fonts: defaults.max_cached_fonts,
        }
    }
}

impl FontsConfig {
    pub fn to_registry_config(&self) -> FontRegistryConfig {
        FontRegistryConfig {
            local_dir: self.local_dir.clone(),
            fallback_families: self.fallback_families.clone(),
            system_fonts: self.system_fonts,
            max_cached_fonts: self.max_cached_fonts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Encoder quality for lossy formats, 1-100 (default: 95)
    pub quality: u8,
    pub prefix: String,
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

fn default_cancel_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// How long cancel waits for the worker (default: 3000)
    #[serde(default = "default_cancel_timeout_ms")]
    pub cancel_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cancel_timeout_ms: default_cancel_timeout_ms(),
        }
    }
}

impl BatchConfig {
    pub fn cancel_timeout(&self) -> Duration {
        Duration::from_millis(self.cancel_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub dir: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by RUST_LOG (default: info)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });
        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        // An empty document deserializes to unit, not to a map
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(format!(
                "output.quality must be between 1 and 100, got {}",
                self.output.quality
            ));
        }

        if self.batch.cancel_timeout_ms == 0 {
            return Err("batch.cancel_timeout_ms must be greater than 0".to_string());
        }

        if self.fonts.max_cached_fonts == Some(0) {
            return Err("fonts.max_cached_fonts must be greater than 0 when set".to_string());
        }

        if self.logging.level.trim().is_empty() {
            return Err("logging.level cannot be empty".to_string());
        }

        Ok(())
    }
}
