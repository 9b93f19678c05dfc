//! The owned query specification.
//!
//! A [`Query`] describes a SELECT: target table, select list, condition,
//! ordering and paging. Every method takes `self` and returns the updated
//! value, so a query is assembled by chaining and consumed when compiled.

use crate::condition::Condition;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// One select-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// A column, `*`, `table.*` or `column AS alias`; validated on build.
    Field(String),
    /// A raw SQL expression under a validated alias, e.g. `COUNT(*) AS n`.
    ///
    /// The expression is spliced verbatim and must never carry user input.
    Expr { expr: String, alias: String },
}

impl From<&str> for SelectItem {
    fn from(field: &str) -> Self {
        SelectItem::Field(field.to_string())
    }
}

impl From<String> for SelectItem {
    fn from(field: String) -> Self {
        SelectItem::Field(field)
    }
}

/// SELECT specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    table: String,
    fields: Vec<SelectItem>,
    condition: Option<Condition>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Start a query against `table`.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Replace the select list.
    #[must_use]
    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields
            .into_iter()
            .map(|f| SelectItem::Field(f.into()))
            .collect();
        self
    }

    /// Append to the select list.
    #[must_use]
    pub fn add_select(mut self, field: impl Into<String>) -> Self {
        self.fields.push(SelectItem::Field(field.into()));
        self
    }

    /// Append a computed `expr AS alias` column. Only the alias is validated.
    #[must_use]
    pub fn select_expr(mut self, expr: impl Into<String>, alias: impl Into<String>) -> Self {
        self.fields.push(SelectItem::Expr {
            expr: expr.into(),
            alias: alias.into(),
        });
        self
    }

    /// Replace the condition.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// AND another term onto the condition.
    #[must_use]
    pub fn and_filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// OR another term onto the condition.
    #[must_use]
    pub fn or_filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.or(condition),
            None => condition,
        });
        self
    }

    /// Append an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Point the query at another table, keeping everything else.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[SelectItem] {
        &self.fields
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Take the condition out, leaving none.
    pub fn take_condition(&mut self) -> Option<Condition> {
        self.condition.take()
    }

    pub fn order(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }
}
