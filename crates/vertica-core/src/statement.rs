//! A SQL statement with positional parameters.

use std::fmt;

use crate::literal::quote_value;
use crate::value::Value;

/// SQL text using `?` placeholders, plus the values bound to them.
///
/// The driver binds `params` for execution. [`Statement::render`] inlines them
/// as escaped literals, which is the form used for logging and for comparing
/// generated SQL in tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Bind one more parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// The SQL text with placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Whether the statement has no text.
    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Split into text and parameters.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// SQL with every placeholder replaced by its escaped literal.
    pub fn render(&self) -> String {
        render_sql(&self.sql, &self.params)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Inline `params` into `sql`.
///
/// Placeholders inside quoted strings or quoted identifiers are left alone.
/// A placeholder without a matching parameter renders as `NULL`.
pub fn render_sql(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut next = params.iter();
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => {
                quote = Some(ch);
                out.push(ch);
            }
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            (None, '?') => match next.next() {
                Some(value) => out.push_str(&quote_value(value)),
                None => out.push_str("NULL"),
            },
            (_, c) => out.push(c),
        }
    }
    out
}
