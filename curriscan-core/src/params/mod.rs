//! Configuration parameter extraction.
//!
//! Reads the field declarations of a task's `*Config` class without
//! importing or executing anything.
//!
//! # Components
//!
//! - `param_extractor`: Walks the class body and records each field
//! - `render`: Rebuilds canonical single-line text for types and defaults
//!
//! # Example Usage
//!
//! ```ignore
//! use curriscan_core::params::extract_config;
//!
//! let source = std::fs::read_to_string("tasks/arithmetic/basic.py")?;
//! if let Some(section) = extract_config(&source)? {
//!     for (name, param) in &section {
//!         println!("{name}: {:?} = {:?}", param.type_expr, param.value_expr);
//!     }
//! }
//! ```

pub mod param_extractor;
pub mod render;

pub use param_extractor::{
    config_from_parsed, extract_config, extract_config_with, ConfigSection, ParameterDescriptor,
};
pub use render::render;
