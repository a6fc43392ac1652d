//! Configuration loading from curriscan.toml.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Config file looked up at the scan root.
pub const CONFIG_FILE: &str = "curriscan.toml";

/// Class-name suffix of configuration classes.
pub const DEFAULT_CONFIG_SUFFIX: &str = "Config";

/// Class-name suffix of curriculum classes.
pub const DEFAULT_CURRICULUM_SUFFIX: &str = "Curriculum";

/// Constructor names that declare a curriculum attribute.
pub const DEFAULT_ATTRIBUTE_CALLS: &[&str] = &["ScalarAttributeDefinition", "RangeAttributeDefinition"];

/// Aggregator module that re-exports every task and is never analyzed itself.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &["composite.py"];

/// Main configuration structure for curriscan.toml.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CurriscanConfig {
    /// Directory name report paths are made relative to.
    pub anchor: Option<String>,
    /// File names never analyzed (in addition to `__init__.py`).
    pub exclude_files: Option<Vec<String>>,
    /// Directory names pruned during discovery.
    pub exclude_dirs: Option<Vec<String>>,
    /// Class and call naming.
    pub classes: Option<ClassesConfig>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// `[classes]` table.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClassesConfig {
    pub config_suffix: Option<String>,
    pub curriculum_suffix: Option<String>,
    pub attribute_calls: Option<Vec<String>>,
}

/// Output format configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    /// Report file path, relative to the working directory.
    pub path: Option<String>,
    /// Output format: "json" or "plain".
    pub format: Option<String>,
}

/// What the extractors look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub config_suffix: String,
    pub curriculum_suffix: String,
    pub attribute_calls: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            config_suffix: DEFAULT_CONFIG_SUFFIX.to_string(),
            curriculum_suffix: DEFAULT_CURRICULUM_SUFFIX.to_string(),
            attribute_calls: DEFAULT_ATTRIBUTE_CALLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExtractOptions {
    /// Apply the `[classes]` table on top of these options.
    pub fn merged_with(mut self, classes: &ClassesConfig) -> Self {
        if let Some(suffix) = &classes.config_suffix {
            self.config_suffix = suffix.clone();
        }
        if let Some(suffix) = &classes.curriculum_suffix {
            self.curriculum_suffix = suffix.clone();
        }
        if let Some(calls) = &classes.attribute_calls {
            self.attribute_calls = calls.clone();
        }
        self
    }

    /// Whether `name` is one of the recognized attribute constructors.
    pub fn is_attribute_call(&self, name: &str) -> bool {
        self.attribute_calls.iter().any(|call| call == name)
    }
}

/// Loads configuration from curriscan.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<CurriscanConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content).context("Invalid curriscan.toml")?;
    Ok(Some(cfg))
}
