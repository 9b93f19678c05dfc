//! SQL literal rendering.
//!
//! Statements are executed with bound parameters. Literals are only rendered
//! for logs, error messages and the textual form of a statement, so the
//! escaping here must be complete on its own.

use crate::value::Value;

/// Render a value as a Vertica SQL literal.
///
/// Strings are single-quoted with embedded quotes doubled; numbers are
/// passed through; booleans become `TRUE`/`FALSE`.
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::Double(v) if v.is_finite() => format_double(*v),
        Value::Double(v) => quote_str(&v.to_string()),
        Value::Decimal(s) => {
            if is_numeric_literal(s) {
                s.clone()
            } else {
                quote_str(s)
            }
        }
        Value::Text(s) => quote_str(s),
    }
}

/// Single-quote a string, doubling embedded quotes.
///
/// NUL bytes cannot be represented in a Vertica string literal and are dropped.
pub fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\0' => {}
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn format_double(v: f64) -> String {
    let s = v.to_string();
    if s.contains(['.', 'e', 'E']) {
        s
    } else {
        format!("{s}.0")
    }
}

fn is_numeric_literal(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for ch in body.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}
