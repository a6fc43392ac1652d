//! Class span location.
//!
//! Finds the first class whose name ends with a given suffix (`Config`,
//! `Curriculum`, ...) and reports its line range. Lookup is structural: the
//! whole file is parsed once and class nodes are matched by name, so headers
//! inside strings or comments never match and indentation quirks (tabs,
//! comment-only lines, continuation lines) cannot cut a body short.

use regex::Regex;
use tree_sitter::Node;

use crate::error::{CurriscanError, CurriscanResult};
use crate::parse::{ParsedSource, Preorder};

/// The located class: its syntax node plus its line range.
#[derive(Debug, Clone)]
pub struct ClassSpan<'t> {
    pub node: Node<'t>,
    /// Class name as written.
    pub name: String,
    /// Header row (0-indexed).
    pub start_line: usize,
    /// First row after the span (exclusive).
    pub end_line: usize,
    /// Leading-whitespace width of the header line.
    pub indent: usize,
}

impl<'t> ClassSpan<'t> {
    /// The class body block.
    pub fn body(&self) -> Option<Node<'t>> {
        self.node.child_by_field_name("body")
    }
}

/// Locate the first class whose name ends with `suffix`.
///
/// Returns `Ok(None)` when the file simply has no such class. Returns
/// [`CurriscanError::Malformed`] when the class exists but its block does
/// not parse, or when a textual header is present but the tree around it is
/// too broken to contain a class node.
pub fn locate_class<'t>(
    parsed: &'t ParsedSource<'_>,
    suffix: &str,
) -> CurriscanResult<Option<ClassSpan<'t>>> {
    let found = Preorder::new(parsed.root()).find(|node| {
        node.kind() == "class_definition"
            && node
                .child_by_field_name("name")
                .is_some_and(|name| parsed.text(name).ends_with(suffix))
    });

    let Some(node) = found else {
        if parsed.has_errors() && has_class_header(parsed.source(), suffix) {
            return Err(CurriscanError::malformed(format!(
                "class header ending in `{suffix}` is not part of a parseable block"
            )));
        }
        return Ok(None);
    };

    let start_line = node.start_position().row;
    if node.has_error() {
        return Err(CurriscanError::malformed_at(
            format!("class body ending in `{suffix}` contains syntax errors"),
            start_line + 1,
        ));
    }

    let lines: Vec<&str> = parsed.source().lines().collect();
    let indent = lines
        .get(start_line)
        .map(|line| leading_width(line))
        .unwrap_or(0);

    // Blank lines after the last token still belong to the span.
    let end = node.end_position();
    let mut end_line = if end.column == 0 && end.row > start_line {
        end.row
    } else {
        end.row + 1
    };

    // tree-sitter closes the class before a line that dedents to no
    // enclosing block and reattaches that line elsewhere without an error.
    if let Some(row) = orphaned_body_line(&lines, end_line, indent) {
        return Err(CurriscanError::malformed_at(
            format!("class body ending in `{suffix}` dedents to an unmatched indentation level"),
            row + 1,
        ));
    }
    while lines.get(end_line).is_some_and(|line| line.trim().is_empty()) {
        end_line += 1;
    }

    let name = node
        .child_by_field_name("name")
        .map(|name| parsed.text(name).to_string())
        .unwrap_or_default();

    Ok(Some(ClassSpan {
        node,
        name,
        start_line,
        end_line: end_line.min(lines.len().max(start_line + 1)),
        indent,
    }))
}

/// Line-range contract over raw text: `(start_line, end_line)` of the first
/// class whose name ends with `suffix`, or `None` when there is none or it
/// does not parse.
pub fn locate_class_span(source: &str, suffix: &str) -> Option<(usize, usize)> {
    let parsed = ParsedSource::parse(source).ok()?;
    let span = locate_class(&parsed, suffix).ok()??;
    Some((span.start_line, span.end_line))
}

/// Cheap textual pre-filter: does any line look like `class <ident><suffix>(...):`?
pub fn has_class_header(source: &str, suffix: &str) -> bool {
    class_header_regex(suffix)
        .map(|re| re.is_match(source))
        .unwrap_or(false)
}

fn class_header_regex(suffix: &str) -> Option<Regex> {
    let escaped = regex::escape(suffix);
    Regex::new(&format!(r"(?m)^\s*class\s+(\w*{escaped})\s*(\[.*?\])?\s*(\(.*?\))?\s*:"))
        .ok()
}

/// First code line at or after `from` that is still indented deeper than
/// the class header. Scanning stops at the first line back at header depth.
fn orphaned_body_line(lines: &[&str], from: usize, class_indent: usize) -> Option<usize> {
    for (row, line) in lines.iter().enumerate().skip(from) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if leading_width(line) <= class_indent {
            return None;
        }
        return Some(row);
    }
    None
}

fn leading_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
