//! Restricted evaluator for `levels` expressions.
//!
//! Recognized forms, tried in order:
//!
//! 1. Literal container (`[...]`, `(...)`, `{...}`): each element must be a
//!    literal, a unary operation on one, arithmetic over literals, or a
//!    nested container following the same rule.
//! 2. `range(stop)`, `range(start, stop)`, `range(start, stop, step)` with
//!    integer arguments.
//! 3. `list(range(...))`.
//!
//! Everything else evaluates to `None`. No names are looked up and nothing
//! is called; the only work done is arithmetic on constants.

use super::expr::{BinOp, ContainerKind, Expr, UnaryOp};
use super::literal::Literal;

/// Longest sequence a `range(...)` may expand to.
pub const MAX_RANGE_LEN: i128 = 100_000;

/// Longest string a `+` concatenation may produce.
const MAX_STR_LEN: usize = 10_000;

const RANGE: &str = "range";
const MATERIALIZE: &str = "list";

/// Evaluate a `levels` expression into its concrete sequence of values.
pub fn evaluate(expr: &Expr) -> Option<Vec<Literal>> {
    match expr {
        Expr::Container { kind, elements } => evaluate_container(*kind, elements),
        Expr::Call { .. } => {
            if let Some(range_args) = range_call(expr) {
                return evaluate_range(range_args);
            }
            match expr {
                Expr::Call {
                    func,
                    args,
                    has_keywords: false,
                } if func == MATERIALIZE => match args.as_slice() {
                    [inner] => range_call(inner).and_then(evaluate_range),
                    _ => None,
                },
                _ => None,
            }
        }
        _ => None,
    }
}

fn evaluate_container(kind: ContainerKind, elements: &[Expr]) -> Option<Vec<Literal>> {
    let values = elements
        .iter()
        .map(evaluate_scalar)
        .collect::<Option<Vec<_>>>()?;

    if kind == ContainerKind::Set {
        let mut unique: Vec<Literal> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.iter().any(|seen| value_eq(seen, &value)) {
                unique.push(value);
            }
        }
        return Some(unique);
    }
    Some(values)
}

/// Equality as set membership sees it: `1`, `1.0` and `True` are one value.
fn value_eq(a: &Literal, b: &Literal) -> bool {
    match (a, b) {
        (Literal::Seq(xs), Literal::Seq(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| value_eq(x, y))
        }
        (Literal::Float(_), _) | (_, Literal::Float(_)) if a.is_numeric() && b.is_numeric() => {
            a.as_float() == b.as_float()
        }
        _ if a.is_numeric() && b.is_numeric() => a.as_int() == b.as_int(),
        _ => a == b,
    }
}

/// Evaluate a single element: a constant, unary/binary arithmetic whose
/// leaves are all constants, or a nested container of such elements.
pub fn evaluate_scalar(expr: &Expr) -> Option<Literal> {
    match expr {
        Expr::Constant(value) => Some(value.clone()),
        Expr::UnaryOp { op, operand } => apply_unary(*op, &evaluate_scalar(operand)?),
        Expr::BinOp { op, left, right } => {
            apply_binary(*op, &evaluate_scalar(left)?, &evaluate_scalar(right)?)
        }
        Expr::Container { kind, elements } => {
            evaluate_container(*kind, elements).map(Literal::Seq)
        }
        _ => None,
    }
}

/// Arguments of a recognized `range(...)` call.
fn range_call(expr: &Expr) -> Option<&[Expr]> {
    match expr {
        Expr::Call {
            func,
            args,
            has_keywords: false,
        } if func == RANGE && (1..=3).contains(&args.len()) => Some(args),
        _ => None,
    }
}

fn evaluate_range(args: &[Expr]) -> Option<Vec<Literal>> {
    let ints = args
        .iter()
        .map(|arg| match evaluate_scalar(arg)? {
            value @ (Literal::Int(_) | Literal::Bool(_)) => value.as_int(),
            _ => None,
        })
        .collect::<Option<Vec<i64>>>()?;

    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return None,
    };
    if step == 0 {
        return None;
    }

    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 && start < stop {
        (stop - start + step - 1) / step
    } else if step < 0 && start > stop {
        (start - stop - step - 1) / -step
    } else {
        0
    };
    if len > MAX_RANGE_LEN {
        return None;
    }

    (0..len)
        .map(|i| i64::try_from(start + i * step).ok().map(Literal::Int))
        .collect()
}

fn apply_unary(op: UnaryOp, value: &Literal) -> Option<Literal> {
    match (op, value) {
        (UnaryOp::Neg, Literal::Float(v)) => Some(Literal::Float(-v)),
        (UnaryOp::Pos, Literal::Float(v)) => Some(Literal::Float(*v)),
        (UnaryOp::Invert, Literal::Float(_)) => None,
        (UnaryOp::Neg, other) => other.as_int()?.checked_neg().map(Literal::Int),
        (UnaryOp::Pos, other) => other.as_int().map(Literal::Int),
        (UnaryOp::Invert, other) => other.as_int().map(|v| Literal::Int(!v)),
    }
}

fn apply_binary(op: BinOp, left: &Literal, right: &Literal) -> Option<Literal> {
    if let (Literal::Str(a), Literal::Str(b)) = (left, right) {
        return match op {
            BinOp::Add if a.len() + b.len() <= MAX_STR_LEN => Some(Literal::Str(format!("{a}{b}"))),
            _ => None,
        };
    }
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }

    match (left, right) {
        (Literal::Float(_), _) | (_, Literal::Float(_)) => {
            float_binary(op, left.as_float()?, right.as_float()?)
        }
        _ => int_binary(op, left.as_int()?, right.as_int()?),
    }
}

fn int_binary(op: BinOp, a: i64, b: i64) -> Option<Literal> {
    let value = match op {
        BinOp::Add => a.checked_add(b)?,
        BinOp::Sub => a.checked_sub(b)?,
        BinOp::Mul => a.checked_mul(b)?,
        BinOp::Div => return float_binary(op, a as f64, b as f64),
        BinOp::FloorDiv => floor_div(a, b)?,
        BinOp::Mod => floor_mod(a, b)?,
        BinOp::Pow => {
            if b < 0 {
                return float_binary(op, a as f64, b as f64);
            }
            a.checked_pow(u32::try_from(b).ok()?)?
        }
    };
    Some(Literal::Int(value))
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Option<Literal> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return None;
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return None;
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return None;
            }
            a.powf(b)
        }
    };
    value.is_finite().then_some(Literal::Float(value))
}

/// Division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder taking the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}
