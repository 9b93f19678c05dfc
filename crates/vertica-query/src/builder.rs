//! Statement builders for INSERT, UPDATE, DELETE and counter updates.
//!
//! Each builder takes a table name and structured input and produces a
//! [`Statement`] with `?` placeholders. Table and column names are validated;
//! values are always bound.

use vertica_core::{Error, Result, Statement, Value, validate_identifier};

use crate::condition::Condition;

/// INSERT statement builder.
///
/// # Example
///
/// ```
/// use vertica_query::InsertBuilder;
///
/// let stmt = InsertBuilder::new("customers")
///     .value("name", "Acme")
///     .value("status", 1)
///     .build()
///     .unwrap();
/// assert_eq!(stmt.render(), "INSERT INTO customers (name, status) VALUES ('Acme', 1)");
/// ```
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    values: Vec<(String, Value)>,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
        }
    }

    /// Add one column value.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Add several column values in order.
    #[must_use]
    pub fn values<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.values
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build `INSERT INTO t (cols) VALUES (?, ...)`, or
    /// `INSERT INTO t DEFAULT VALUES` when no column is given.
    pub fn build(&self) -> Result<Statement> {
        let table = validate_identifier(&self.table)?;
        if self.values.is_empty() {
            return Ok(Statement::new(format!("INSERT INTO {table} DEFAULT VALUES")));
        }
        let columns = self
            .values
            .iter()
            .map(|(c, _)| validate_identifier(c))
            .collect::<Result<Vec<_>>>()?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        let params = self.values.iter().map(|(_, v)| v.clone()).collect();
        Ok(Statement::with_params(sql, params))
    }
}

/// UPDATE statement builder.
///
/// The primary-key column, when set with [`UpdateBuilder::primary_key`], is
/// never written in SET and pins the WHERE clause.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    sets: Vec<(String, Value)>,
    primary_key: Option<(String, Value)>,
    condition: Option<Condition>,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            sets: Vec::new(),
            primary_key: None,
            condition: None,
        }
    }

    /// Set a column to a value.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((column.into(), value.into()));
        self
    }

    /// Set several columns.
    #[must_use]
    pub fn set_all<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.sets
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Pin the update on `column = value` and drop `column` from SET.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.primary_key = Some((column.into(), value.into()));
        self
    }

    /// AND a condition onto the WHERE clause.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Build `UPDATE t SET c=?, ... [WHERE ...]`.
    ///
    /// Fails when nothing is left to SET once the primary key is removed.
    pub fn build(&self) -> Result<Statement> {
        let table = validate_identifier(&self.table)?;
        let pk_column = self.primary_key.as_ref().map(|(c, _)| c.as_str());

        let mut params = Vec::new();
        let mut assignments = Vec::new();
        for (column, value) in &self.sets {
            if Some(column.as_str()) == pk_column {
                continue;
            }
            assignments.push(format!("{}=?", validate_identifier(column)?));
            params.push(value.clone());
        }
        if assignments.is_empty() {
            return Err(Error::execution(format!(
                "UPDATE on {table} has no columns to set"
            )));
        }

        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        let condition = match (&self.primary_key, &self.condition) {
            (Some((c, v)), Some(extra)) => Some(Condition::eq(c.clone(), v.clone()).and(extra.clone())),
            (Some((c, v)), None) => Some(Condition::eq(c.clone(), v.clone())),
            (None, extra) => extra.clone(),
        };
        if let Some(condition) = condition.filter(|c| !c.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.build(&mut params)?);
        }
        Ok(Statement::with_params(sql, params))
    }
}

/// DELETE statement builder.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    condition: Option<Condition>,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            condition: None,
        }
    }

    /// AND a condition onto the WHERE clause.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Build `DELETE FROM t [WHERE ...]`.
    pub fn build(&self) -> Result<Statement> {
        let mut sql = format!("DELETE FROM {}", validate_identifier(&self.table)?);
        let mut params = Vec::new();
        if let Some(condition) = self.condition.as_ref().filter(|c| !c.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.build(&mut params)?);
        }
        Ok(Statement::with_params(sql, params))
    }
}

/// Counter UPDATE builder: `UPDATE t SET c=c+? WHERE ...`.
#[derive(Debug, Clone)]
pub struct CounterUpdateBuilder {
    table: String,
    counters: Vec<(String, i64)>,
    condition: Option<Condition>,
}

impl CounterUpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            counters: Vec::new(),
            condition: None,
        }
    }

    /// Add `delta` to `column`.
    #[must_use]
    pub fn counter(mut self, column: impl Into<String>, delta: i64) -> Self {
        self.counters.push((column.into(), delta));
        self
    }

    /// AND a condition onto the WHERE clause.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn build(&self) -> Result<Statement> {
        let table = validate_identifier(&self.table)?;
        if self.counters.is_empty() {
            return Err(Error::execution(format!(
                "counter update on {table} has no counters"
            )));
        }
        let mut params = Vec::new();
        let mut assignments = Vec::new();
        for (column, delta) in &self.counters {
            let column = validate_identifier(column)?;
            assignments.push(format!("{column}={column}+?"));
            params.push(Value::BigInt(*delta));
        }
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        if let Some(condition) = self.condition.as_ref().filter(|c| !c.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.build(&mut params)?);
        }
        Ok(Statement::with_params(sql, params))
    }
}
