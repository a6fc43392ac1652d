//! Configuration parameter extraction.
//!
//! Walks the direct statements of the first `*Config` class and records:
//! - `name: T = value`
//! - `name: T`
//! - `name = value` (and every name of a chained `a = b = value`)
//!
//! Values are rendered as source text, never evaluated: defaults routinely
//! reference module constants or call factories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tree_sitter::Node;

use super::render::render;
use crate::config::ExtractOptions;
use crate::error::CurriscanResult;
use crate::locate::locate_class;
use crate::parse::{significant_children, ParsedSource};

/// One configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    /// Declared annotation text, e.g. `Optional[int]`.
    pub type_expr: Option<String>,
    /// Default value text, e.g. `field(default_factory=list)`.
    pub value_expr: Option<String>,
}

/// Parameters keyed by name. Repeated names keep the last assignment.
pub type ConfigSection = BTreeMap<String, ParameterDescriptor>;

/// Collects parameters from one class body.
struct ParamExtractor<'p, 's> {
    parsed: &'p ParsedSource<'s>,
    results: ConfigSection,
}

impl<'p, 's> ParamExtractor<'p, 's> {
    fn new(parsed: &'p ParsedSource<'s>) -> Self {
        Self {
            parsed,
            results: ConfigSection::new(),
        }
    }

    fn record_param(&mut self, name: &str, type_expr: Option<String>, value_expr: Option<String>) {
        self.results.insert(
            name.to_string(),
            ParameterDescriptor {
                name: name.to_string(),
                type_expr,
                value_expr,
            },
        );
    }

    fn visit_body(&mut self, body: Node<'_>) {
        for statement in significant_children(body) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            for expr in significant_children(statement) {
                if expr.kind() == "assignment" {
                    self.visit_assignment(expr);
                }
            }
        }
    }

    fn visit_assignment(&mut self, assignment: Node<'_>) {
        // `a = b = 1` nests: assignment(a, right: assignment(b, right: 1)).
        let mut targets = Vec::new();
        let mut type_expr = None;
        let mut current = assignment;
        loop {
            targets.push(current.child_by_field_name("left"));
            if let Some(ty) = current.child_by_field_name("type") {
                type_expr = Some(render(ty, self.parsed));
            }
            match current.child_by_field_name("right") {
                Some(next) if next.kind() == "assignment" => current = next,
                right => {
                    let value_expr = right.map(|value| render(value, self.parsed));
                    for target in targets.into_iter().flatten() {
                        if target.kind() == "identifier" {
                            let name = self.parsed.text(target);
                            self.record_param(name, type_expr.clone(), value_expr.clone());
                        }
                    }
                    return;
                }
            }
        }
    }
}

/// Extract configuration parameters using the default class suffix.
pub fn extract_config(source: &str) -> CurriscanResult<Option<ConfigSection>> {
    extract_config_with(source, &ExtractOptions::default())
}

/// Extract configuration parameters with explicit options.
pub fn extract_config_with(
    source: &str,
    options: &ExtractOptions,
) -> CurriscanResult<Option<ConfigSection>> {
    let parsed = ParsedSource::parse(source)?;
    config_from_parsed(&parsed, options)
}

/// Extract configuration parameters from an already parsed file.
///
/// `Ok(None)` means the file has no configuration class.
pub fn config_from_parsed(
    parsed: &ParsedSource<'_>,
    options: &ExtractOptions,
) -> CurriscanResult<Option<ConfigSection>> {
    let Some(span) = locate_class(parsed, &options.config_suffix)? else {
        return Ok(None);
    };

    let mut extractor = ParamExtractor::new(parsed);
    if let Some(body) = span.body() {
        extractor.visit_body(body);
    }
    Ok(Some(extractor.results))
}
