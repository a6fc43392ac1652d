//! curriscan-core: static extraction of task metadata from Python sources
//!
//! Reads two kinds of declarations out of a tree of Python task modules
//! without importing or running them:
//!
//! - **Configuration parameters**: the fields of a `*Config` class, each with
//!   its annotation text and default-value text
//! - **Curriculum levels**: attribute-definition calls inside a `*Curriculum`
//!   class, with each `levels=` expression evaluated to concrete values by a
//!   restricted, side-effect-free evaluator
//!
//! Results are collected into one report keyed by normalized file path.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use curriscan_core::prelude::*;
//!
//! let run = Curriscan::new("/path/to/reasoning_gym").run()?;
//! print_json(&run.outcome.report)?;
//! ```
//!
//! Single files can be handled directly:
//!
//! ```rust,ignore
//! let config = extract_config(&source)?;
//! let levels = extract_levels(&source)?;
//! ```
//!
//! # Module Organization
//!
//! - [`parse`]: tree-sitter parsing, traversal, and path helpers
//! - [`locate`]: Finding the first class with a given name suffix
//! - [`params`]: Configuration parameter extraction
//! - [`levels`]: Curriculum level extraction and expression evaluation
//! - [`aggregate`]: Per-file pipeline and report assembly
//! - [`scan`]: Parallel file discovery
//! - [`report`]: Report model and output
//! - [`cache`]: Incremental cache with SHA-256 change detection
//! - [`builder`]: Fluent builder API for configuration
//! - [`error`]: Typed error handling
//!
//! # Cargo Features
//!
//! - `cache` (default): Enable the incremental cache
//! - `full`: Enable all optional features

// Core modules (always available)
pub mod aggregate;
pub mod builder;
pub mod config;
pub mod error;
pub mod levels;
pub mod locate;
pub mod logging;
pub mod params;
pub mod parse;
pub mod prelude;
pub mod report;
pub mod scan;

// Feature-gated modules
#[cfg(feature = "cache")]
pub mod cache;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{CurriscanError, CurriscanResult, IoResultExt};

// Builder API
pub use builder::{Curriscan, CurriscanRun};

// Configuration
pub use config::{
    load_config, ClassesConfig, CurriscanConfig, ExtractOptions, OutputConfig, CONFIG_FILE,
    DEFAULT_ATTRIBUTE_CALLS, DEFAULT_CONFIG_SUFFIX, DEFAULT_CURRICULUM_SUFFIX,
    DEFAULT_EXCLUDED_FILES,
};

// Logging
pub use logging::{init_structured_logging, log_error, log_event, log_info, log_warn};

// Parsing
pub use parse::{
    anchor_relative_path, normalize_path_string, path_to_normalized_string, ParsedSource,
    Preorder,
};

// Class location
pub use locate::{has_class_header, locate_class, locate_class_span, ClassSpan};

// Extraction
pub use levels::{
    evaluate, extract_levels, extract_levels_with, levels_from_parsed, lower, Expr,
    LevelAttribute, LevelSection, Literal,
};
pub use params::{
    config_from_parsed, extract_config, extract_config_with, render, ConfigSection,
    ParameterDescriptor,
};

// Aggregation
pub use aggregate::{
    aggregate_files, extract_file_record, report_key, AggregateOutcome, AggregateSettings,
    FileFailure, MAX_FILE_SIZE,
};

// Reporting
pub use report::{print_json, print_plain, to_json_string, write_report, AggregateReport, FileRecord};

// File scanning
pub use scan::{gather_py_files, is_candidate, Discovery};

// Feature-gated re-exports
#[cfg(feature = "cache")]
pub use cache::{
    incremental_aggregate, load_cache, save_cache, CacheMetadata, CachedRecord,
    CurriscanCache, CACHE_DIR,
};
