//! Canonical source text of an expression node.
//!
//! The text is rebuilt from tokens rather than sliced from the file, so
//! comments, line breaks and incidental spacing never leak into the report:
//!
//! ```text
//! weights = (        ->  "(1, 2)"
//!     1,  # first
//!     2,
//! )
//! ```

use tree_sitter::Node;

use crate::parse::ParsedSource;

/// One leaf token and the kind of its parent node.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: &'static str,
    text: &'a str,
    parent: &'static str,
    /// Named, non-comment children of the parent (used for `(x,)` tuples).
    parent_arity: usize,
}

/// Render `node` as canonical single-line source text.
pub fn render(node: Node<'_>, parsed: &ParsedSource<'_>) -> String {
    let tokens = collect_tokens(node, parsed);
    let mut out = String::with_capacity(parsed.text(node).len());
    let mut prev: Option<Token<'_>> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.kind == "," && is_droppable_trailing_comma(token, tokens.get(i + 1)) {
            continue;
        }
        if let Some(p) = prev {
            if needs_space(&p, token) {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev = Some(*token);
    }
    out
}

/// Leaf tokens in document order. String literals are kept whole; comments
/// and explicit line continuations are dropped.
fn collect_tokens<'a>(node: Node<'_>, parsed: &ParsedSource<'a>) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    let mut stack: Vec<(Node<'_>, &'static str, usize)> = vec![(node, "", 0)];

    while let Some((current, parent, parent_arity)) = stack.pop() {
        match current.kind() {
            "comment" | "line_continuation" => continue,
            _ => {}
        }
        if current.child_count() == 0 || current.kind() == "string" {
            let text = parsed.text(current);
            if !text.is_empty() {
                tokens.push(Token {
                    kind: current.kind(),
                    text,
                    parent,
                    parent_arity,
                });
            }
            continue;
        }

        let mut cursor = current.walk();
        let children: Vec<Node<'_>> = current.children(&mut cursor).collect();
        let arity = children
            .iter()
            .filter(|c| c.is_named() && c.kind() != "comment")
            .count();
        for child in children.into_iter().rev() {
            stack.push((child, current.kind(), arity));
        }
    }
    tokens
}

fn is_opening(kind: &str) -> bool {
    matches!(kind, "(" | "[" | "{")
}

fn is_closing(kind: &str) -> bool {
    matches!(kind, ")" | "]" | "}")
}

/// Trailing commas are dropped, except the one that makes `(x,)` a tuple.
fn is_droppable_trailing_comma(comma: &Token<'_>, next: Option<&Token<'_>>) -> bool {
    let before_close = next.is_some_and(|n| is_closing(n.kind));
    before_close && !(comma.parent == "tuple" && comma.parent_arity == 1)
}

fn needs_space(prev: &Token<'_>, cur: &Token<'_>) -> bool {
    if is_opening(prev.kind) || is_closing(cur.kind) {
        return false;
    }
    if cur.kind == "," {
        return false;
    }
    if prev.kind == "," {
        return true;
    }
    if prev.kind == "." || cur.kind == "." {
        return false;
    }
    if cur.kind == ":" {
        return false;
    }
    if prev.kind == ":" {
        return prev.parent != "slice";
    }
    if is_opening(cur.kind) {
        // Calls and subscripts hug their callee; anything after an operator
        // or keyword is a fresh operand.
        return !matches!(prev.kind, "identifier" | ")" | "]" | "}" | "string");
    }
    if prev.kind == "=" || cur.kind == "=" {
        let tight = |t: &Token<'_>| matches!(t.parent, "keyword_argument" | "default_parameter" | "typed_default_parameter");
        if (prev.kind == "=" && tight(prev)) || (cur.kind == "=" && tight(cur)) {
            return false;
        }
    }
    if prev.parent == "unary_operator" && matches!(prev.kind, "-" | "+" | "~") {
        return false;
    }
    if matches!(prev.kind, "*" | "**")
        && matches!(
            prev.parent,
            "list_splat" | "dictionary_splat" | "list_splat_pattern" | "dictionary_splat_pattern"
        )
    {
        return false;
    }
    true
}
