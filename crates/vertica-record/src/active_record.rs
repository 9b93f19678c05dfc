//! The [`ActiveRecord`] trait.
//!
//! A record type names its table and wraps a [`Record`]; everything else
//! (finders, persistence, bulk operations, relation loading) comes from the
//! provided methods. Column sets and primary keys are discovered through the
//! catalog and cached by the connection's schema cache.
//!
//! ```ignore
//! struct Customer(Record);
//!
//! impl ActiveRecord for Customer {
//!     const TABLE_NAME: &'static str = "customers";
//!
//!     fn from_record(record: Record) -> Self { Customer(record) }
//!     fn record(&self) -> &Record { &self.0 }
//!     fn record_mut(&mut self) -> &mut Record { &mut self.0 }
//!
//!     fn relations() -> Vec<Relation> {
//!         vec![Relation::has_many("orders", "orders", "customer_id", "id")]
//!     }
//! }
//!
//! let mut acme = Customer::new_record();
//! acme.set("name", "Acme");
//! acme.insert(&mut conn, true, None)?;
//!
//! let active = Customer::find()
//!     .filter(Condition::eq("status", 1))
//!     .with("orders")
//!     .all(&mut conn)?;
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use vertica_core::{
    BulkError, BulkFailure, Driver, Error, Result, Row, Statement, Value, validate_identifier,
};
use vertica_query::{Condition, CounterUpdateBuilder, DeleteBuilder, InsertBuilder, Query, UpdateBuilder};

use crate::active_query::ActiveQuery;
use crate::connection::Connection;
use crate::record::{Record, Related};
use crate::relation::{self, Relation};

/// A row-mapped entity of one table.
pub trait ActiveRecord: Sized {
    /// Table the type maps to.
    const TABLE_NAME: &'static str;

    fn from_record(record: Record) -> Self;
    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;

    /// Relations this type declares.
    fn relations() -> Vec<Relation> {
        Vec::new()
    }

    /// Columns [`ActiveRecord::update_all_counters`] may touch.
    fn counter_columns() -> &'static [&'static str] {
        &[]
    }

    // ========================================================================
    // Hooks
    // ========================================================================

    /// Validate before a save; `false` cancels it.
    fn validate(&mut self, _attributes: Option<&[&str]>) -> bool {
        true
    }

    /// Runs before insert or update; `false` cancels the save.
    fn before_save(&mut self, _insert: bool) -> bool {
        true
    }

    /// Runs after a successful save with the attributes written.
    fn after_save(&mut self, _insert: bool, _changed: &IndexMap<String, Value>) {}

    /// Runs before an instance delete; `false` cancels it.
    fn before_delete(&mut self) -> bool {
        true
    }

    fn after_delete(&mut self) {}

    /// Runs on every record materialized by a query.
    fn after_find(&mut self) {}

    // ========================================================================
    // Construction & attributes
    // ========================================================================

    /// A new, unsaved record.
    fn new_record() -> Self {
        Self::from_record(Record::new(Self::TABLE_NAME))
    }

    /// Build a record from a fetched row, flagging columns unknown to the
    /// catalog as extras.
    fn populate_record<D: Driver>(conn: &mut Connection<D>, row: Row) -> Result<Self> {
        let columns = Self::attributes(conn)?;
        Ok(Self::from_record(Record::from_row(
            Self::TABLE_NAME,
            &columns,
            row,
        )))
    }

    /// Catalog column names of the table.
    fn attributes<D: Driver>(conn: &mut Connection<D>) -> Result<Arc<[String]>> {
        conn.table_columns(Self::TABLE_NAME)
    }

    /// Inferred primary-key column of the table; empty if there is none.
    fn primary_key<D: Driver>(conn: &mut Connection<D>) -> Result<String> {
        conn.table_primary_key(Self::TABLE_NAME)
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.record().get(name)
    }

    fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.record_mut().set(name, value);
    }

    fn is_new_record(&self) -> bool {
        self.record().is_new()
    }

    /// Current value of the primary-key column.
    fn primary_key_value<D: Driver>(&self, conn: &mut Connection<D>) -> Result<Option<Value>> {
        let pk = Self::primary_key(conn)?;
        Ok(self.get(&pk).filter(|v| !v.is_null()).cloned())
    }

    /// Primary key as a `column -> value` map; empty without a key.
    fn primary_key_map<D: Driver>(
        &self,
        conn: &mut Connection<D>,
    ) -> Result<IndexMap<String, Value>> {
        let pk = Self::primary_key(conn)?;
        let mut map = IndexMap::new();
        if !pk.is_empty() {
            map.insert(pk.clone(), self.get(&pk).cloned().unwrap_or_default());
        }
        Ok(map)
    }

    fn to_json(&self) -> serde_json::Value {
        self.record().to_json()
    }

    // ========================================================================
    // Finders
    // ========================================================================

    fn find() -> ActiveQuery<Self> {
        ActiveQuery::new()
    }

    fn find_one<D: Driver>(conn: &mut Connection<D>, condition: Condition) -> Result<Option<Self>> {
        Self::find().filter(condition).one(conn)
    }

    fn find_all<D: Driver>(conn: &mut Connection<D>, condition: Condition) -> Result<Vec<Self>> {
        Self::find().filter(condition).all(conn)
    }

    fn find_by_pk<D: Driver>(
        conn: &mut Connection<D>,
        value: impl Into<Value>,
    ) -> Result<Option<Self>> {
        let pk = require_primary_key::<Self, D>(conn)?;
        Self::find().filter(Condition::eq(pk, value)).one(conn)
    }

    fn find_all_by_pk<D: Driver>(conn: &mut Connection<D>, values: Vec<Value>) -> Result<Vec<Self>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let pk = require_primary_key::<Self, D>(conn)?;
        Self::find().filter(Condition::In(pk, values)).all(conn)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Insert the dirty attributes (optionally limited to `attributes`).
    ///
    /// Returns `Ok(false)` when validation or `before_save` cancels the
    /// insert. Generated identity values are not read back.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(table = Self::TABLE_NAME))]
    fn insert<D: Driver>(
        &mut self,
        conn: &mut Connection<D>,
        run_validation: bool,
        attributes: Option<&[&str]>,
    ) -> Result<bool> {
        if run_validation && !self.validate(attributes) {
            tracing::debug!("Insert cancelled by validation");
            return Ok(false);
        }
        if !self.before_save(true) {
            tracing::debug!("Insert cancelled by before_save");
            return Ok(false);
        }

        let columns = Self::attributes(conn)?;
        let values = writable(self.record().dirty_attributes(attributes), &columns);
        let statement = InsertBuilder::new(Self::TABLE_NAME)
            .values(values.clone())
            .build()?;
        conn.execute_statement(&statement)?;

        self.record_mut().mark_written(&values);
        tracing::info!(columns = values.len(), "Inserted record");
        self.after_save(true, &values);
        Ok(true)
    }

    /// Write the dirty attributes of a persisted record, pinned on its
    /// primary key.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(table = Self::TABLE_NAME))]
    fn update<D: Driver>(
        &mut self,
        conn: &mut Connection<D>,
        run_validation: bool,
        attributes: Option<&[&str]>,
    ) -> Result<bool> {
        if run_validation && !self.validate(attributes) {
            tracing::debug!("Update cancelled by validation");
            return Ok(false);
        }
        if !self.before_save(false) {
            tracing::debug!("Update cancelled by before_save");
            return Ok(false);
        }

        let pk = require_primary_key::<Self, D>(conn)?;
        let pk_value = stored_key(self.record(), &pk)?;
        let columns = Self::attributes(conn)?;
        let mut values = writable(self.record().dirty_attributes(attributes), &columns);
        values.retain(|name, _| !name.eq_ignore_ascii_case(&pk));

        if !values.is_empty() {
            let statement = UpdateBuilder::new(Self::TABLE_NAME)
                .set_all(values.clone())
                .primary_key(pk, pk_value)
                .build()?;
            let affected = conn.execute_statement(&statement)?;
            tracing::info!(columns = values.len(), rows = affected, "Updated record");
        }

        self.record_mut().mark_written(&values);
        self.after_save(false, &values);
        Ok(true)
    }

    /// Insert a new record or update a persisted one, with validation.
    fn save<D: Driver>(&mut self, conn: &mut Connection<D>) -> Result<bool> {
        if self.is_new_record() {
            self.insert(conn, true, None)
        } else {
            self.update(conn, true, None)
        }
    }

    /// Delete this record by primary key; returns the affected row count.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(table = Self::TABLE_NAME))]
    fn delete<D: Driver>(&mut self, conn: &mut Connection<D>) -> Result<u64> {
        if !self.before_delete() {
            return Ok(0);
        }
        let pk = require_primary_key::<Self, D>(conn)?;
        let pk_value = stored_key(self.record(), &pk)?;
        let statement = DeleteBuilder::new(Self::TABLE_NAME)
            .filter(Condition::eq(pk, pk_value))
            .build()?;
        let affected = conn.execute_statement(&statement)?;
        self.record_mut().mark_deleted();
        self.after_delete();
        Ok(affected)
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Single UPDATE of `attributes` for rows matching `condition`.
    ///
    /// The condition must pin the primary key to a value; otherwise nothing
    /// runs and `0` is returned. The primary-key column is never written.
    #[tracing::instrument(level = "debug", skip_all, fields(table = Self::TABLE_NAME))]
    fn update_all<D, K, V, I>(
        conn: &mut Connection<D>,
        attributes: I,
        condition: &Condition,
    ) -> Result<u64>
    where
        D: Driver,
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let pk = Self::primary_key(conn)?;
        if pk.is_empty() || condition.pinned_value(&pk).is_none() {
            tracing::debug!(primary_key = %pk, "Condition does not pin the primary key");
            return Ok(0);
        }
        let sets: Vec<(String, Value)> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !k.eq_ignore_ascii_case(&pk))
            .collect();
        if sets.is_empty() {
            return Ok(0);
        }
        let statement = UpdateBuilder::new(Self::TABLE_NAME)
            .set_all(sets)
            .filter(condition.clone())
            .build()?;
        conn.execute_statement(&statement)
    }

    /// Add deltas to counter columns of every row matching `condition`,
    /// one statement per primary key.
    ///
    /// Counter names must be listed in [`ActiveRecord::counter_columns`] and
    /// exist in the catalog. Every key is attempted; failures are collected
    /// into [`Error::Bulk`].
    #[tracing::instrument(level = "debug", skip_all, fields(table = Self::TABLE_NAME))]
    fn update_all_counters<D: Driver>(
        conn: &mut Connection<D>,
        counters: &[(&str, i64)],
        condition: &Condition,
    ) -> Result<u64> {
        let columns = Self::attributes(conn)?;
        for (name, _) in counters {
            validate_identifier(name)?;
            let allowed = Self::counter_columns().iter().any(|c| *c == *name)
                && columns.iter().any(|c| c.eq_ignore_ascii_case(name));
            if !allowed {
                return Err(Error::InvalidIdentifier((*name).to_string()));
            }
        }
        if counters.is_empty() {
            return Ok(0);
        }

        let pk = require_primary_key::<Self, D>(conn)?;
        let keys = resolve_keys(conn, Self::TABLE_NAME, &pk, Some(condition))?;
        run_per_key(conn, "update_all_counters", Self::TABLE_NAME, keys, |key| {
            counters
                .iter()
                .fold(CounterUpdateBuilder::new(Self::TABLE_NAME), |b, (c, d)| {
                    b.counter(*c, *d)
                })
                .filter(Condition::eq(pk.clone(), key.clone()))
                .build()
        })
    }

    /// Delete every row matching `condition` (all rows for `None`), one
    /// statement per primary key.
    ///
    /// Every key is attempted; failures are collected into [`Error::Bulk`].
    /// A table without a primary key gets a single DELETE instead.
    #[tracing::instrument(level = "debug", skip_all, fields(table = Self::TABLE_NAME))]
    fn delete_all<D: Driver>(
        conn: &mut Connection<D>,
        condition: Option<&Condition>,
    ) -> Result<u64> {
        let pk = Self::primary_key(conn)?;
        if pk.is_empty() {
            let mut builder = DeleteBuilder::new(Self::TABLE_NAME);
            if let Some(condition) = condition {
                builder = builder.filter(condition.clone());
            }
            return conn.execute_statement(&builder.build()?);
        }

        let keys = resolve_keys(conn, Self::TABLE_NAME, &pk, condition)?;
        run_per_key(conn, "delete_all", Self::TABLE_NAME, keys, |key| {
            DeleteBuilder::new(Self::TABLE_NAME)
                .filter(Condition::eq(pk.clone(), key.clone()))
                .build()
        })
    }

    // ========================================================================
    // Relations
    // ========================================================================

    /// Loaded relation data, without querying.
    fn related(&self, name: &str) -> Option<&Related> {
        self.record().related(name)
    }

    /// Relation data, loading it on first access.
    fn fetch_related<D: Driver>(&mut self, conn: &mut Connection<D>, name: &str) -> Result<&Related> {
        if !self.record().is_relation_populated(name) {
            relation::load(conn, &Self::relations(), name, &mut [self.record_mut()])?;
        }
        self.record()
            .related(name)
            .ok_or_else(|| Error::Unsupported(format!("unknown relation {name:?}")))
    }

    /// Relation unlinking is not supported.
    fn unlink(&mut self, name: &str, _other: &Record) -> Result<()> {
        Err(Error::Unsupported(format!(
            "unlinking relation {name:?} is not supported"
        )))
    }

    /// Relation unlinking is not supported.
    fn unlink_all(&mut self, name: &str) -> Result<()> {
        Err(Error::Unsupported(format!(
            "unlinking relation {name:?} is not supported"
        )))
    }
}

fn require_primary_key<M: ActiveRecord, D: Driver>(conn: &mut Connection<D>) -> Result<String> {
    let pk = M::primary_key(conn)?;
    if pk.is_empty() {
        return Err(Error::Unsupported(format!(
            "table {} has no primary key",
            M::TABLE_NAME
        )));
    }
    Ok(pk)
}

/// Key value the row was loaded with, falling back to the current value.
fn stored_key(record: &Record, pk: &str) -> Result<Value> {
    record
        .old_attribute(pk)
        .or_else(|| record.get(pk))
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| {
            Error::execution(format!(
                "record of {} has no value for primary key {pk}",
                record.table()
            ))
        })
}

/// Keep only attributes that are catalog columns. An empty catalog keeps all.
fn writable(values: IndexMap<String, Value>, columns: &[String]) -> IndexMap<String, Value> {
    if columns.is_empty() {
        return values;
    }
    values
        .into_iter()
        .filter(|(name, _)| columns.iter().any(|c| c.eq_ignore_ascii_case(name)))
        .collect()
}

/// Primary keys affected by `condition`: taken straight from a condition on
/// the key alone, otherwise selected from the table.
fn resolve_keys<D: Driver>(
    conn: &mut Connection<D>,
    table: &str,
    pk: &str,
    condition: Option<&Condition>,
) -> Result<Vec<Value>> {
    if let Some(keys) = condition.and_then(|c| c.pinned_values(pk)) {
        return Ok(keys);
    }
    let mut query = Query::from(table).select([pk]);
    if let Some(condition) = condition {
        query = query.filter(condition.clone());
    }
    let statement = conn.query_builder().build(&query)?;
    Ok(conn
        .exec(&statement)?
        .filter_map(|row| row.get(0).cloned())
        .filter(|v| !v.is_null())
        .collect())
}

/// Run one statement per key. Every key is attempted.
fn run_per_key<D, F>(
    conn: &mut Connection<D>,
    operation: &'static str,
    table: &str,
    keys: Vec<Value>,
    build: F,
) -> Result<u64>
where
    D: Driver,
    F: Fn(&Value) -> Result<Statement>,
{
    let total = keys.len();
    let mut affected = 0;
    let mut failures = Vec::new();
    for key in keys {
        match build(&key).and_then(|statement| conn.execute_statement(&statement)) {
            Ok(rows) => affected += rows,
            Err(e) => {
                tracing::warn!(operation, table, key = %key, error = %e, "Bulk item failed");
                failures.push(BulkFailure {
                    key,
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        operation,
        table,
        keys = total,
        failed = failures.len(),
        rows = affected,
        "Bulk operation finished"
    );
    if failures.is_empty() {
        Ok(affected)
    } else {
        Err(Error::Bulk(BulkError {
            operation,
            table: table.to_string(),
            failures,
            affected,
        }))
    }
}
