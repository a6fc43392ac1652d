//! Source parsing layer.
//!
//! Every analyzed file is parsed exactly once with tree-sitter-python. The
//! extractors then operate on the resulting concrete syntax tree; nothing in
//! this crate ever executes or imports the analyzed code.

use std::path::{Component, Path};

use tree_sitter::{Node, Parser, Tree};

use crate::error::{CurriscanError, CurriscanResult};

/// A parsed source file: the syntax tree together with the text it indexes.
pub struct ParsedSource<'src> {
    tree: Tree,
    source: &'src str,
}

impl<'src> ParsedSource<'src> {
    /// Parse Python source text into a syntax tree.
    ///
    /// tree-sitter is error tolerant, so this only fails when the grammar
    /// cannot be loaded. Syntax errors show up as `ERROR`/`MISSING` nodes
    /// and are judged by the caller for the region it cares about.
    pub fn parse(source: &'src str) -> CurriscanResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| CurriscanError::grammar(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| CurriscanError::grammar("parser returned no tree"))?;

        Ok(Self { tree, source })
    }

    /// Root `module` node.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The full source text.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Exact source slice covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &'src str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or_default()
    }

    /// Whether any part of the file failed to parse.
    pub fn has_errors(&self) -> bool {
        self.root().has_error()
    }
}

/// Pre-order iterator over the named descendants of a node (the node itself
/// first). Uses an explicit stack so pathological nesting cannot overflow.
pub struct Preorder<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Preorder<'t> {
    pub fn new(node: Node<'t>) -> Self {
        Self { stack: vec![node] }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        let node = self.stack.pop()?;
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}

/// Named children of `node`, skipping comments.
pub fn significant_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Normalize a path string to use forward slashes consistently.
///
/// Report keys must be identical whichever platform produced them.
#[inline]
pub fn normalize_path_string(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert a Path to a normalized string (forward slashes).
#[inline]
pub fn path_to_normalized_string(path: &Path) -> String {
    normalize_path_string(&path.display().to_string())
}

/// Rewrite `path` relative to the right-most directory component named
/// `anchor`, keeping the anchor itself.
///
/// `/home/me/gym/reasoning_gym/arithmetic/sum.py` with anchor
/// `reasoning_gym` becomes `reasoning_gym/arithmetic/sum.py`. The file name
/// itself is never treated as the anchor. Returns `None` when no directory
/// component matches.
pub fn anchor_relative_path(path: &Path, anchor: &str) -> Option<String> {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    let dirs = parts.len().checked_sub(1)?;
    let start = parts[..dirs].iter().rposition(|part| part == anchor)?;
    Some(parts[start..].join("/"))
}
