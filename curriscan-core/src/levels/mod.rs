//! Curriculum level extraction.
//!
//! Finds attribute-definition calls inside a `*Curriculum` class and turns
//! each `levels=` argument into concrete values without running any code.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ level_extractor.rs  │     │      expr.rs        │
//! │  ─────────────────  │────▶│  ─────────────────  │
//! │  Find attribute     │     │  Lower syntax nodes │
//! │  definition calls   │     │  to a tagged Expr   │
//! └─────────────────────┘     └──────────┬──────────┘
//!                                        ▼
//!            ┌─────────────────────┐     ┌─────────────────────┐
//!            │    literal.rs       │◀────│   level_eval.rs     │
//!            │  ─────────────────  │     │  ─────────────────  │
//!            │  Literal values,    │     │  Containers, range, │
//!            │  number/str parsing │     │  constant arithmetic│
//!            └─────────────────────┘     └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use curriscan_core::levels::extract_levels;
//!
//! let source = r#"
//! class SizeCurriculum(BaseCurriculum):
//!     def __init__(self):
//!         self._define_attributes(
//!             ScalarAttributeDefinition(name="size", levels=list(range(2, 10, 2))),
//!         )
//! "#;
//! let section = extract_levels(source)?.unwrap();
//! assert_eq!(section["size"].levels.as_ref().unwrap().len(), 4);
//! ```

pub mod expr;
pub mod level_eval;
pub mod level_extractor;
pub mod literal;

pub use expr::{lower, BinOp, ContainerKind, Expr, UnaryOp};
pub use level_eval::{evaluate, evaluate_scalar, MAX_RANGE_LEN};
pub use level_extractor::{
    extract_levels, extract_levels_with, levels_from_parsed, LevelAttribute, LevelSection,
};
pub use literal::Literal;
