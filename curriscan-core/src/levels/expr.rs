//! Tagged expression grammar for `levels` values, and lowering from the
//! tree-sitter syntax tree into it.
//!
//! The grammar is deliberately closed: anything outside it lowers to
//! [`Expr::Unsupported`] and is rejected by the evaluator.

use tree_sitter::Node;

use super::literal::{decode_string_literal, parse_float, parse_integer, Literal};
use crate::parse::{significant_children, ParsedSource};

/// Lowering stops descending past this depth and yields `Unsupported`.
pub const MAX_LOWER_DEPTH: usize = 64;

/// Literal container shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Tuple,
    Set,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `~x`
    Invert,
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "//" => Self::FloorDiv,
            "%" => Self::Mod,
            "**" => Self::Pow,
            _ => return None,
        })
    }
}

/// Expression tree the evaluator understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Literal),
    Container {
        kind: ContainerKind,
        elements: Vec<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call with positional arguments. `func` is the dotted callee text.
    Call {
        func: String,
        args: Vec<Expr>,
        has_keywords: bool,
    },
    /// Anything else; carries the syntax node kind for diagnostics.
    Unsupported(String),
}

impl Expr {
    /// Shorthand for an integer constant.
    pub fn int(value: i64) -> Self {
        Expr::Constant(Literal::Int(value))
    }

    /// Shorthand for a string constant.
    pub fn str(value: &str) -> Self {
        Expr::Constant(Literal::Str(value.to_string()))
    }

    /// The string value if this is a string constant.
    pub fn as_str_constant(&self) -> Option<&str> {
        match self {
            Expr::Constant(Literal::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// Lower a syntax node into the expression grammar.
pub fn lower(node: Node<'_>, parsed: &ParsedSource<'_>) -> Expr {
    lower_at(node, parsed, 0)
}

fn lower_at(node: Node<'_>, parsed: &ParsedSource<'_>, depth: usize) -> Expr {
    if depth > MAX_LOWER_DEPTH {
        return Expr::Unsupported("nesting too deep".to_string());
    }
    let unsupported = || Expr::Unsupported(node.kind().to_string());

    match node.kind() {
        "integer" => parse_integer(parsed.text(node))
            .map(|v| Expr::Constant(Literal::Int(v)))
            .unwrap_or_else(unsupported),
        "float" => parse_float(parsed.text(node))
            .map(|v| Expr::Constant(Literal::Float(v)))
            .unwrap_or_else(unsupported),
        "true" => Expr::Constant(Literal::Bool(true)),
        "false" => Expr::Constant(Literal::Bool(false)),
        "none" => Expr::Constant(Literal::None),
        "string" => decode_string_literal(parsed.text(node))
            .map(|s| Expr::Constant(Literal::Str(s)))
            .unwrap_or_else(unsupported),
        "concatenated_string" => significant_children(node)
            .into_iter()
            .map(|part| decode_string_literal(parsed.text(part)))
            .collect::<Option<Vec<_>>>()
            .map(|parts| Expr::Constant(Literal::Str(parts.concat())))
            .unwrap_or_else(unsupported),
        "parenthesized_expression" => match significant_children(node).as_slice() {
            [inner] => lower_at(*inner, parsed, depth + 1),
            _ => unsupported(),
        },
        "list" | "tuple" | "set" => {
            let kind = match node.kind() {
                "list" => ContainerKind::List,
                "tuple" => ContainerKind::Tuple,
                _ => ContainerKind::Set,
            };
            let elements = significant_children(node)
                .into_iter()
                .map(|child| lower_at(child, parsed, depth + 1))
                .collect();
            Expr::Container { kind, elements }
        }
        "unary_operator" => {
            let op = match node.child_by_field_name("operator").map(|n| n.kind()) {
                Some("-") => UnaryOp::Neg,
                Some("+") => UnaryOp::Pos,
                Some("~") => UnaryOp::Invert,
                _ => return unsupported(),
            };
            match node.child_by_field_name("argument") {
                Some(arg) => Expr::UnaryOp {
                    op,
                    operand: Box::new(lower_at(arg, parsed, depth + 1)),
                },
                None => unsupported(),
            }
        }
        "binary_operator" => {
            let parts = (
                node.child_by_field_name("left"),
                node.child_by_field_name("operator")
                    .and_then(|op| BinOp::from_token(op.kind())),
                node.child_by_field_name("right"),
            );
            match parts {
                (Some(left), Some(op), Some(right)) => Expr::BinOp {
                    op,
                    left: Box::new(lower_at(left, parsed, depth + 1)),
                    right: Box::new(lower_at(right, parsed, depth + 1)),
                },
                _ => unsupported(),
            }
        }
        "call" => lower_call(node, parsed, depth).unwrap_or_else(unsupported),
        _ => unsupported(),
    }
}

fn lower_call(node: Node<'_>, parsed: &ParsedSource<'_>, depth: usize) -> Option<Expr> {
    let function = node.child_by_field_name("function")?;
    if !matches!(function.kind(), "identifier" | "attribute") {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    if arguments.kind() != "argument_list" {
        return None;
    }

    let mut args = Vec::new();
    let mut has_keywords = false;
    for arg in significant_children(arguments) {
        match arg.kind() {
            "keyword_argument" => has_keywords = true,
            "list_splat" | "dictionary_splat" => {
                args.push(Expr::Unsupported(arg.kind().to_string()))
            }
            _ => args.push(lower_at(arg, parsed, depth + 1)),
        }
    }

    Some(Expr::Call {
        func: parsed.text(function).split_whitespace().collect(),
        args,
        has_keywords,
    })
}
