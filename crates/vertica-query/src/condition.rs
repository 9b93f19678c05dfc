//! Condition trees for WHERE clauses.

use vertica_core::{Result, Value, validate_identifier};

/// Comparison operators for range terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A WHERE condition.
///
/// Column names are validated when the condition is compiled; values are
/// always bound as parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`, or `column IS NULL` for a NULL value.
    Eq(String, Value),
    /// `column <op> value`.
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// `column BETWEEN low AND high`.
    Between(String, Value, Value),
    /// `column IN (values...)`; an empty list matches nothing.
    In(String, Vec<Value>),
    /// `column IS NULL`.
    IsNull(String),
    /// `column IS NOT NULL`.
    IsNotNull(String),
    /// All terms must hold; an empty list always holds.
    And(Vec<Condition>),
    /// Any term must hold; an empty list never holds.
    Or(Vec<Condition>),
    /// Negation.
    Not(Box<Condition>),
}

impl Condition {
    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(column.into(), value.into())
    }

    /// `column <> value`.
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    /// `column < value`.
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    /// `column <= value`.
    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    /// `column > value`.
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// `column >= value`.
    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column BETWEEN low AND high`.
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Condition::Between(column.into(), low.into(), high.into())
    }

    /// `column IN (values...)`.
    pub fn in_list<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    /// `column IS NOT NULL`.
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Condition::IsNotNull(column.into())
    }

    /// Hash-style condition: every `(column, value)` pair must be equal.
    pub fn hash<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let terms: Vec<Condition> = pairs.into_iter().map(|(k, v)| Self::eq(k, v)).collect();
        if terms.len() == 1 {
            terms.into_iter().next().unwrap_or(Condition::And(Vec::new()))
        } else {
            Condition::And(terms)
        }
    }

    /// Combine with another condition using AND, flattening nested ANDs.
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        match (self, other) {
            (Condition::And(mut a), Condition::And(b)) => {
                a.extend(b);
                Condition::And(a)
            }
            (Condition::And(mut a), b) => {
                a.push(b);
                Condition::And(a)
            }
            (a, Condition::And(mut b)) => {
                b.insert(0, a);
                Condition::And(b)
            }
            (a, b) => Condition::And(vec![a, b]),
        }
    }

    /// Combine with another condition using OR, flattening nested ORs.
    #[must_use]
    pub fn or(self, other: Condition) -> Self {
        match (self, other) {
            (Condition::Or(mut a), Condition::Or(b)) => {
                a.extend(b);
                Condition::Or(a)
            }
            (Condition::Or(mut a), b) => {
                a.push(b);
                Condition::Or(a)
            }
            (a, b) => Condition::Or(vec![a, b]),
        }
    }

    /// Negate the condition.
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Whether the condition holds trivially (an empty AND).
    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::And(terms) if terms.iter().all(Condition::is_empty))
    }

    /// The literal value `column` is pinned to, if the condition is
    /// `column = v` or an AND containing such a term. NULL does not pin.
    /// Column names compare case-insensitively, as Vertica folds them.
    pub fn pinned_value(&self, column: &str) -> Option<&Value> {
        match self {
            Condition::Eq(c, v) if c.eq_ignore_ascii_case(column) && !v.is_null() => Some(v),
            Condition::And(terms) => terms.iter().find_map(|t| t.pinned_value(column)),
            _ => None,
        }
    }

    /// Every value `column` is restricted to when the whole condition is a
    /// single `column = v` or `column IN (...)` term.
    pub fn pinned_values(&self, column: &str) -> Option<Vec<Value>> {
        match self {
            Condition::Eq(c, v) if c.eq_ignore_ascii_case(column) && !v.is_null() => {
                Some(vec![v.clone()])
            }
            Condition::In(c, values) if c.eq_ignore_ascii_case(column) => {
                Some(values.iter().filter(|v| !v.is_null()).cloned().collect())
            }
            Condition::And(terms) if terms.len() == 1 => terms[0].pinned_values(column),
            _ => None,
        }
    }

    /// Compile into SQL text with `?` placeholders, appending bound values.
    pub fn build(&self, params: &mut Vec<Value>) -> Result<String> {
        let mut sql = String::new();
        self.write(&mut sql, params, false)?;
        Ok(sql)
    }

    fn write(&self, sql: &mut String, params: &mut Vec<Value>, nested: bool) -> Result<()> {
        match self {
            Condition::Eq(column, Value::Null) | Condition::IsNull(column) => {
                sql.push_str(validate_identifier(column)?);
                sql.push_str(" IS NULL");
            }
            Condition::IsNotNull(column) => {
                sql.push_str(validate_identifier(column)?);
                sql.push_str(" IS NOT NULL");
            }
            Condition::Eq(column, value) => {
                sql.push_str(validate_identifier(column)?);
                sql.push_str("=?");
                params.push(value.clone());
            }
            Condition::Compare { column, op, value } => {
                sql.push_str(validate_identifier(column)?);
                sql.push_str(op.as_sql());
                sql.push('?');
                params.push(value.clone());
            }
            Condition::Between(column, low, high) => {
                sql.push_str(validate_identifier(column)?);
                sql.push_str(" BETWEEN ? AND ?");
                params.push(low.clone());
                params.push(high.clone());
            }
            Condition::In(column, values) => {
                if values.is_empty() {
                    sql.push_str("1=0");
                } else {
                    sql.push_str(validate_identifier(column)?);
                    sql.push_str(" IN (");
                    sql.push_str(&vec!["?"; values.len()].join(", "));
                    sql.push(')');
                    params.extend(values.iter().cloned());
                }
            }
            Condition::And(terms) => write_group(sql, params, terms, " AND ", "1=1", nested)?,
            Condition::Or(terms) => write_group(sql, params, terms, " OR ", "1=0", nested)?,
            Condition::Not(inner) => {
                sql.push_str("NOT (");
                inner.write(sql, params, false)?;
                sql.push(')');
            }
        }
        Ok(())
    }
}

fn write_group(
    sql: &mut String,
    params: &mut Vec<Value>,
    terms: &[Condition],
    separator: &str,
    empty: &str,
    nested: bool,
) -> Result<()> {
    let terms: Vec<&Condition> = terms.iter().filter(|t| !t.is_empty()).collect();
    match terms.as_slice() {
        [] => sql.push_str(empty),
        [single] => single.write(sql, params, nested)?,
        many => {
            if nested {
                sql.push('(');
            }
            for (i, term) in many.iter().enumerate() {
                if i > 0 {
                    sql.push_str(separator);
                }
                term.write(sql, params, true)?;
            }
            if nested {
                sql.push(')');
            }
        }
    }
    Ok(())
}
