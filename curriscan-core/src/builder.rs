//! Builder pattern API for curriscan runs.
//!
//! Provides a fluent interface for configuring and running extraction:
//!
//! ```rust,ignore
//! use curriscan_core::prelude::*;
//!
//! let run = Curriscan::new("/path/to/reasoning_gym")
//!     .exclude_dirs(["fixtures"])
//!     .with_cache(true)
//!     .run()?;
//!
//! write_report(Path::new("data.json"), &run.outcome.report)?;
//! ```
//!
//! Settings from `curriscan.toml` at the scan root are applied first; values
//! set on the builder take precedence.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::aggregate::{aggregate_files, AggregateOutcome, AggregateSettings};
use crate::config::{load_config, ExtractOptions, OutputConfig, CONFIG_FILE, DEFAULT_EXCLUDED_FILES};
use crate::error::CurriscanError;
use crate::scan::{gather_py_files, is_candidate};

/// Builder for configuring an extraction run.
#[derive(Debug, Clone)]
pub struct Curriscan {
    /// Directory to scan
    root: PathBuf,

    /// Anchor directory name for report paths
    anchor: Option<String>,

    /// Exact file names never analyzed
    exclude_files: Option<Vec<String>>,

    /// Extra directory names pruned during discovery
    excluded_dirs: Vec<String>,

    config_suffix: Option<String>,
    curriculum_suffix: Option<String>,
    attribute_calls: Option<Vec<String>>,

    /// Whether to use the incremental cache
    use_cache: bool,

    /// Whether to read curriscan.toml
    use_config: bool,
}

impl Curriscan {
    /// Create a new run builder for the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            anchor: None,
            exclude_files: None,
            excluded_dirs: Vec::new(),
            config_suffix: None,
            curriculum_suffix: None,
            attribute_calls: None,
            use_cache: false,
            use_config: true,
        }
    }

    /// Directory name report paths are made relative to.
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Replace the excluded file names.
    pub fn exclude_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Class-name suffix of configuration classes.
    pub fn config_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config_suffix = Some(suffix.into());
        self
    }

    /// Class-name suffix of curriculum classes.
    pub fn curriculum_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.curriculum_suffix = Some(suffix.into());
        self
    }

    /// Constructor names recognized as attribute definitions.
    pub fn attribute_calls(mut self, calls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.attribute_calls = Some(calls.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable the incremental cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Enable or disable reading `curriscan.toml`.
    pub fn with_config(mut self, enabled: bool) -> Self {
        self.use_config = enabled;
        self
    }

    /// Scan, extract, and assemble the report.
    pub fn run(&self) -> Result<CurriscanRun> {
        // 1. Resolve the root
        if !self.root.is_dir() {
            return Err(CurriscanError::invalid_argument(format!(
                "{} is not a directory",
                self.root.display()
            ))
            .into());
        }
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", self.root.display()))?;

        // 2. Merge file config with builder settings
        let file_config = if self.use_config {
            load_config(&root).map_err(|e| CurriscanError::config(root.join(CONFIG_FILE), format!("{e:#}")))?
        } else {
            None
        };
        let file_config = file_config.unwrap_or_default();

        let mut options = match &file_config.classes {
            Some(classes) => ExtractOptions::default().merged_with(classes),
            None => ExtractOptions::default(),
        };
        if let Some(suffix) = &self.config_suffix {
            options.config_suffix = suffix.clone();
        }
        if let Some(suffix) = &self.curriculum_suffix {
            options.curriculum_suffix = suffix.clone();
        }
        if let Some(calls) = &self.attribute_calls {
            options.attribute_calls = calls.clone();
        }

        let anchor = self
            .anchor
            .clone()
            .or(file_config.anchor.clone())
            .or_else(|| {
                root.file_name()
                    .map(|name| name.to_string_lossy().to_string())
            })
            .unwrap_or_default();

        let exclude_files = self
            .exclude_files
            .clone()
            .or(file_config.exclude_files.clone())
            .unwrap_or_else(|| DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect());

        let exclude_dirs: Vec<&str> = file_config
            .exclude_dirs
            .iter()
            .flatten()
            .chain(self.excluded_dirs.iter())
            .map(String::as_str)
            .collect();

        let settings = AggregateSettings { anchor, options };
        tracing::info!(
            root = %root.display(),
            anchor = %settings.anchor,
            config_suffix = %settings.options.config_suffix,
            curriculum_suffix = %settings.options.curriculum_suffix,
            "starting scan"
        );

        // 3. Gather candidate files
        let discovery =
            gather_py_files(&root, &exclude_dirs).context("Failed to gather .py files")?;
        let files: Vec<PathBuf> = discovery
            .files
            .into_iter()
            .filter(|file| is_candidate(file, &exclude_files))
            .collect();

        // 4. Extract (incremental if the cache is enabled)
        let mut outcome = self.extract(&root, &files, &settings);
        outcome.failures.extend(discovery.failures);
        tracing::info!(
            candidates = files.len(),
            records = outcome.report.len(),
            skipped = outcome.skipped,
            failures = outcome.failures.len(),
            "scan complete"
        );

        Ok(CurriscanRun {
            root,
            settings,
            candidates: files.len(),
            output: file_config.output,
            outcome,
        })
    }

    #[cfg(feature = "cache")]
    fn extract(&self, root: &std::path::Path, files: &[PathBuf], settings: &AggregateSettings) -> AggregateOutcome {
        if self.use_cache {
            let cached = crate::cache::load_cache(root, &settings.options);
            crate::cache::incremental_aggregate(root, files, settings, cached)
        } else {
            aggregate_files(root, files, settings)
        }
    }

    #[cfg(not(feature = "cache"))]
    fn extract(&self, root: &std::path::Path, files: &[PathBuf], settings: &AggregateSettings) -> AggregateOutcome {
        if self.use_cache {
            tracing::warn!("built without the `cache` feature; running a full extraction");
        }
        aggregate_files(root, files, settings)
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct CurriscanRun {
    /// Canonical scan root
    pub root: PathBuf,

    /// Settings the run resolved to
    pub settings: AggregateSettings,

    /// Files that passed discovery and name filtering
    pub candidates: usize,

    /// `[output]` table from curriscan.toml, if any
    pub output: Option<OutputConfig>,

    pub outcome: AggregateOutcome,
}

impl CurriscanRun {
    /// Whether any file or directory could not be read.
    pub fn has_failures(&self) -> bool {
        self.outcome.has_failures()
    }
}
