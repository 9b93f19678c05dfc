//! Fluent queries bound to a record type.

use std::marker::PhantomData;

use vertica_core::{Driver, Result, Row, Statement, Value};
use vertica_query::{Condition, Direction, Query};

use crate::active_record::ActiveRecord;
use crate::connection::Connection;
use crate::record::Record;
use crate::relation;

/// A query returning records of type `M`.
///
/// Built by [`ActiveRecord::find`]; every method takes and returns the
/// query, which is consumed when executed.
#[derive(Debug, Clone)]
pub struct ActiveQuery<M: ActiveRecord> {
    query: Query,
    with: Vec<String>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: ActiveRecord> Default for ActiveQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ActiveRecord> ActiveQuery<M> {
    pub fn new() -> Self {
        Self {
            query: Query::from(M::TABLE_NAME),
            with: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.query = self.query.select(fields);
        self
    }

    #[must_use]
    pub fn add_select(mut self, field: impl Into<String>) -> Self {
        self.query = self.query.add_select(field);
        self
    }

    /// Select a computed `expr AS alias`; the alias loads as an extra.
    #[must_use]
    pub fn select_expr(mut self, expr: impl Into<String>, alias: impl Into<String>) -> Self {
        self.query = self.query.select_expr(expr, alias);
        self
    }

    /// Replace the condition.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.query = self.query.filter(condition);
        self
    }

    #[must_use]
    pub fn and_filter(mut self, condition: Condition) -> Self {
        self.query = self.query.and_filter(condition);
        self
    }

    #[must_use]
    pub fn or_filter(mut self, condition: Condition) -> Self {
        self.query = self.query.or_filter(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.query = self.query.order_by(column, direction);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.query = self.query.offset(offset);
        self
    }

    /// Eager-load a relation declared by `M`.
    #[must_use]
    pub fn with(mut self, relation: impl Into<String>) -> Self {
        self.with.push(relation.into());
        self
    }

    /// Return raw rows instead of records.
    pub fn as_array(self) -> ArrayQuery {
        ArrayQuery { query: self.query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn eager_relations(&self) -> &[String] {
        &self.with
    }

    /// The compiled SELECT.
    pub fn statement<D: Driver>(&self, conn: &Connection<D>) -> Result<Statement> {
        conn.query_builder().build(&self.query)
    }

    /// Every matching record; an empty result is an empty vector.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub fn all<D: Driver>(self, conn: &mut Connection<D>) -> Result<Vec<M>> {
        let statement = self.statement(conn)?;
        let rows = conn.exec(&statement)?.all_rows();
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.materialize(conn, rows)
    }

    /// First matching record, or `None`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub fn one<D: Driver>(self, conn: &mut Connection<D>) -> Result<Option<M>> {
        let statement = conn.query_builder().build(&first_only(&self.query))?;
        let Some(row) = conn.exec(&statement)?.next_row() else {
            return Ok(None);
        };
        Ok(self.materialize(conn, vec![row])?.into_iter().next())
    }

    /// Number of matching rows.
    pub fn count<D: Driver>(self, conn: &mut Connection<D>) -> Result<u64> {
        let statement = conn.query_builder().build_count(&self.query)?;
        let count = conn
            .exec(&statement)?
            .scalar()
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub fn exists<D: Driver>(self, conn: &mut Connection<D>) -> Result<bool> {
        Ok(self.count(conn)? > 0)
    }

    /// Values of one column across the matching rows.
    pub fn column<D: Driver>(self, conn: &mut Connection<D>, field: &str) -> Result<Vec<Value>> {
        self.select([field]).as_array().column(conn)
    }

    /// Delete the rows this query selects, in one statement.
    ///
    /// Queries with ordering or paging are rejected before anything is sent.
    pub fn delete<D: Driver>(self, conn: &mut Connection<D>) -> Result<u64> {
        let statement = conn.query_builder().build_delete(&self.query)?;
        conn.execute_statement(&statement)
    }

    fn materialize<D: Driver>(&self, conn: &mut Connection<D>, rows: Vec<Row>) -> Result<Vec<M>> {
        let columns = M::attributes(conn)?;
        let mut models: Vec<M> = rows
            .into_iter()
            .map(|row| M::from_record(Record::from_row(M::TABLE_NAME, &columns, row)))
            .collect();

        if !self.with.is_empty() {
            let relations = M::relations();
            let mut records: Vec<&mut Record> = models.iter_mut().map(M::record_mut).collect();
            for name in &self.with {
                relation::load(conn, &relations, name, &mut records)?;
            }
        }
        for model in &mut models {
            model.after_find();
        }
        tracing::debug!(records = models.len(), "Materialized records");
        Ok(models)
    }
}

/// A query returning raw rows.
#[derive(Debug, Clone)]
pub struct ArrayQuery {
    query: Query,
}

impl ArrayQuery {
    pub fn new(query: Query) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn all<D: Driver>(self, conn: &mut Connection<D>) -> Result<Vec<Row>> {
        let statement = conn.query_builder().build(&self.query)?;
        Ok(conn.exec(&statement)?.all_rows())
    }

    pub fn one<D: Driver>(self, conn: &mut Connection<D>) -> Result<Option<Row>> {
        let statement = conn.query_builder().build(&first_only(&self.query))?;
        Ok(conn.exec(&statement)?.next_row())
    }

    /// First column of every row.
    pub fn column<D: Driver>(self, conn: &mut Connection<D>) -> Result<Vec<Value>> {
        Ok(self
            .all(conn)?
            .into_iter()
            .filter_map(|row| row.get(0).cloned())
            .collect())
    }
}

/// `query` limited to one row unless it already carries a limit.
fn first_only(query: &Query) -> Query {
    match query.limit_value() {
        Some(_) => query.clone(),
        None => query.clone().limit(1),
    }
}
