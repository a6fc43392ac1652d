//! Literal values and decoding of Python literal tokens.

use serde::{Deserialize, Serialize};

/// A concrete level value.
///
/// Serialized as the plain JSON value (`null`, `true`, `3`, `0.5`, `"easy"`,
/// `[1, 2]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Nested container value, e.g. `(-1, 1)` in `[(-1, 1), (2, 3)]`.
    Seq(Vec<Literal>),
}

impl Literal {
    /// Integer view used by arithmetic; booleans coerce to 0/1.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(v) => Some(*v),
            Literal::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Whether this value takes part in numeric arithmetic.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float(_) | Literal::Bool(_))
    }

    /// Float view of any numeric literal.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Float(v) => Some(*v),
            other => other.as_int().map(|v| v as f64),
        }
    }
}

/// Decode an `integer` token: decimal, `0x`, `0o`, `0b`, with `_` separators.
///
/// Imaginary literals (`3j`) and values outside `i64` are rejected.
pub fn parse_integer(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    if cleaned.ends_with('j') {
        return None;
    }

    let (digits, radix) = match cleaned.get(..2) {
        Some("0x") => (&cleaned[2..], 16),
        Some("0o") => (&cleaned[2..], 8),
        Some("0b") => (&cleaned[2..], 2),
        _ => (cleaned.as_str(), 10),
    };
    i64::from_str_radix(digits, radix).ok()
}

/// Decode a `float` token such as `1.5`, `.5`, `1e-3` or `1_000.0`.
pub fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    if cleaned.ends_with(['j', 'J']) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Decode a single `string` token (prefix, quotes and escapes).
///
/// Returns `None` for bytes and f-strings: neither is a plain text constant.
pub fn decode_string_literal(text: &str) -> Option<String> {
    let quote_at = text.find(['\'', '"'])?;
    let prefix = text[..quote_at].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') || prefix.chars().any(|c| !"ru".contains(c)) {
        return None;
    }
    let raw = prefix.contains('r');

    let body = &text[quote_at..];
    let quote_len = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        3
    } else {
        1
    };
    if body.len() < quote_len * 2 {
        return None;
    }
    let inner = &body[quote_len..body.len() - quote_len];

    if raw {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

/// Resolve backslash escapes the way a non-raw Python string does.
/// Unknown escapes are kept verbatim.
fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                push_code_point(&mut out, value, &format!("\\{next}"));
            }
            'x' => push_hex(&mut out, &mut chars, 2, 'x'),
            'u' => push_hex(&mut out, &mut chars, 4, 'u'),
            'U' => push_hex(&mut out, &mut chars, 8, 'U'),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn push_hex(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    width: usize,
    marker: char,
) {
    let mut digits = String::with_capacity(width);
    for _ in 0..width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }
    let fallback = format!("\\{marker}{digits}");
    if digits.len() != width {
        out.push_str(&fallback);
        return;
    }
    match u32::from_str_radix(&digits, 16) {
        Ok(value) => push_code_point(out, value, &fallback),
        Err(_) => out.push_str(&fallback),
    }
}

fn push_code_point(out: &mut String, value: u32, fallback: &str) {
    match char::from_u32(value) {
        Some(ch) => out.push(ch),
        None => out.push_str(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_forms() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("0B101"), Some(5));
        assert_eq!(parse_integer("0"), Some(0));
    }

    #[test]
    fn test_parse_integer_rejects_imaginary_and_overflow() {
        assert_eq!(parse_integer("3j"), None);
        assert_eq!(parse_integer("99999999999999999999999"), None);
    }

    #[test]
    fn test_parse_float_forms() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("1_000.25"), Some(1000.25));
        assert_eq!(parse_float("2.5j"), None);
    }

    #[test]
    fn test_decode_plain_strings() {
        assert_eq!(decode_string_literal("\"size\"").as_deref(), Some("size"));
        assert_eq!(decode_string_literal("'size'").as_deref(), Some("size"));
        assert_eq!(decode_string_literal("\"\"\"doc\"\"\"").as_deref(), Some("doc"));
        assert_eq!(decode_string_literal("''").as_deref(), Some(""));
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_string_literal(r#""a\nb""#).as_deref(), Some("a\nb"));
        assert_eq!(decode_string_literal(r#""tab\there""#).as_deref(), Some("tab\there"));
        assert_eq!(decode_string_literal(r#""\x41é""#).as_deref(), Some("Aé"));
        assert_eq!(decode_string_literal(r#""\101""#).as_deref(), Some("A"));
        assert_eq!(decode_string_literal(r#""keep\d""#).as_deref(), Some("keep\\d"));
        assert_eq!(decode_string_literal(r#"'it\'s'"#).as_deref(), Some("it's"));
    }

    #[test]
    fn test_decode_raw_and_unicode_prefixes() {
        assert_eq!(decode_string_literal(r#"r"a\nb""#).as_deref(), Some("a\\nb"));
        assert_eq!(decode_string_literal(r#"u"abc""#).as_deref(), Some("abc"));
        assert_eq!(decode_string_literal(r#"Rb"abc""#), None);
    }

    #[test]
    fn test_decode_rejects_bytes_and_fstrings() {
        assert_eq!(decode_string_literal("b\"abc\""), None);
        assert_eq!(decode_string_literal("f\"{x}\""), None);
    }

    #[test]
    fn test_literal_serializes_natively() {
        let levels = vec![
            Literal::Int(1),
            Literal::Float(0.5),
            Literal::Str("easy".to_string()),
            Literal::Bool(true),
            Literal::None,
            Literal::Seq(vec![Literal::Int(1), Literal::Int(10)]),
        ];
        let json = serde_json::to_string(&levels).unwrap();
        assert_eq!(json, r#"[1,0.5,"easy",true,null,[1,10]]"#);
    }

    #[test]
    fn test_literal_deserializes_ints_before_floats() {
        let levels: Vec<Literal> = serde_json::from_str("[2, 2.0, \"x\", false]").unwrap();
        assert_eq!(
            levels,
            vec![
                Literal::Int(2),
                Literal::Float(2.0),
                Literal::Str("x".to_string()),
                Literal::Bool(false)
            ]
        );
    }

    #[test]
    fn test_bool_coerces_to_int() {
        assert_eq!(Literal::Bool(true).as_int(), Some(1));
        assert_eq!(Literal::Float(1.5).as_int(), None);
        assert_eq!(Literal::Int(3).as_float(), Some(3.0));
    }
}
