//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use curriscan_core::prelude::*;
//! ```

// Errors
pub use crate::error::{CurriscanError, CurriscanResult};

// Per-file extraction
pub use crate::levels::{extract_levels, LevelAttribute, LevelSection, Literal};
pub use crate::params::{extract_config, ConfigSection, ParameterDescriptor};

// Batch runs
pub use crate::aggregate::{aggregate_files, AggregateOutcome, AggregateSettings};
pub use crate::builder::{Curriscan, CurriscanRun};
pub use crate::scan::{gather_py_files, is_candidate, Discovery};

// Reporting
pub use crate::report::{print_json, print_plain, to_json_string, write_report, AggregateReport, FileRecord};

// Configuration
pub use crate::config::{load_config, CurriscanConfig, ExtractOptions};

// Caching
#[cfg(feature = "cache")]
pub use crate::cache::{incremental_aggregate, load_cache, save_cache, CurriscanCache};
