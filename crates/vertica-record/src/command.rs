//! Statement commands.
//!
//! A [`Command`] holds one pending statement against a borrowed
//! [`Connection`]. The `build_*` methods replace the pending statement and
//! return the command for chaining; nothing runs until one of the execution
//! methods is called.

use std::sync::Arc;

use vertica_core::{Driver, Error, Result, Row, Statement, Value};
use vertica_query::{Condition, CounterUpdateBuilder, DeleteBuilder, InsertBuilder, UpdateBuilder};
use vertica_schema::{ColumnInfo, CreateTable, DropTable, catalog};

use crate::connection::Connection;

/// One pending statement bound to a connection.
#[derive(Debug)]
pub struct Command<'c, D: Driver> {
    conn: &'c mut Connection<D>,
    statement: Statement,
}

impl<'c, D: Driver> Command<'c, D> {
    pub fn new(conn: &'c mut Connection<D>) -> Self {
        Self {
            conn,
            statement: Statement::default(),
        }
    }

    /// Replace the pending statement.
    pub fn set_statement(&mut self, statement: Statement) -> &mut Self {
        self.statement = statement;
        self
    }

    /// Replace the pending statement with raw SQL.
    pub fn set_sql(&mut self, sql: impl Into<String>) -> &mut Self {
        self.set_statement(Statement::new(sql))
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Pending SQL with placeholders.
    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    /// Pending SQL with parameters inlined as literals.
    pub fn raw_sql(&self) -> String {
        self.statement.render()
    }

    pub fn connection(&mut self) -> &mut Connection<D> {
        self.conn
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// `INSERT INTO table (cols) VALUES (...)`.
    pub fn build_insert<K, V, I>(&mut self, table: &str, values: I) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let statement = InsertBuilder::new(table).values(values).build()?;
        Ok(self.set_statement(statement))
    }

    /// `UPDATE table SET ... WHERE pk=value`; the primary-key column is
    /// never written.
    pub fn build_update<K, V, I>(
        &mut self,
        table: &str,
        pk_name: &str,
        pk_value: impl Into<Value>,
        attributes: I,
    ) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let statement = UpdateBuilder::new(table)
            .set_all(attributes)
            .primary_key(pk_name, pk_value)
            .build()?;
        Ok(self.set_statement(statement))
    }

    /// `DELETE FROM table WHERE a=? AND b=? ...` from column/value pairs.
    pub fn build_delete<K, V, I>(&mut self, table: &str, condition: I) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.build_delete_where(table, &Condition::hash(condition))
    }

    /// `DELETE FROM table WHERE <condition>`.
    pub fn build_delete_where(&mut self, table: &str, condition: &Condition) -> Result<&mut Self> {
        let statement = DeleteBuilder::new(table)
            .filter(condition.clone())
            .build()?;
        Ok(self.set_statement(statement))
    }

    /// Turn the pending `SELECT ... FROM ...` into `DELETE FROM ...`,
    /// keeping its WHERE clause.
    ///
    /// A query with ORDER BY, LIMIT or OFFSET is rejected: Vertica's DELETE
    /// cannot express them, and dropping them would delete more rows.
    pub fn build_delete_from_query(&mut self) -> Result<&mut Self> {
        let sql = self.statement.sql();
        let from = sql
            .find(" FROM ")
            .filter(|_| sql.trim_start().to_ascii_uppercase().starts_with("SELECT "))
            .ok_or_else(|| {
                Error::execution_for(sql, "the pending statement is not a SELECT ... FROM query")
            })?;
        let tail = &sql[from + 1..];
        let upper = tail.to_ascii_uppercase();
        if [" ORDER BY ", " LIMIT ", " OFFSET "]
            .iter()
            .any(|clause| upper.contains(clause))
        {
            return Err(Error::Unsupported(format!(
                "DELETE cannot honor ORDER BY, LIMIT or OFFSET: {sql}"
            )));
        }
        let params = self.statement.params().to_vec();
        let statement = Statement::with_params(format!("DELETE {tail}"), params);
        Ok(self.set_statement(statement))
    }

    /// `CREATE TABLE table (\n\tname type, ...\n) [options]`.
    pub fn build_create_table<K, T, I>(
        &mut self,
        table: &str,
        columns: I,
        options: Option<&str>,
    ) -> Result<&mut Self>
    where
        K: Into<String>,
        T: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut definition = columns
            .into_iter()
            .fold(CreateTable::new(table), |def, (name, ty)| def.column(name, ty));
        if let Some(options) = options {
            definition = definition.options(options);
        }
        self.build_create(&definition)
    }

    /// CREATE TABLE from a prepared definition.
    pub fn build_create(&mut self, definition: &CreateTable) -> Result<&mut Self> {
        let statement = definition.build()?;
        Ok(self.set_statement(statement))
    }

    /// `DROP TABLE table`.
    pub fn build_drop_table(&mut self, table: &str) -> Result<&mut Self> {
        let statement = DropTable::new(table).build()?;
        Ok(self.set_statement(statement))
    }

    /// `UPDATE table SET c=c+? ... WHERE <condition>`.
    pub fn build_counter_update(
        &mut self,
        table: &str,
        counters: &[(&str, i64)],
        condition: &Condition,
    ) -> Result<&mut Self> {
        let statement = counters
            .iter()
            .fold(CounterUpdateBuilder::new(table), |b, (c, d)| b.counter(*c, *d))
            .filter(condition.clone())
            .build()?;
        Ok(self.set_statement(statement))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run the pending statement; returns the affected row count.
    pub fn execute(&mut self) -> Result<u64> {
        self.ensure_pending()?;
        self.conn.execute_statement(&self.statement)
    }

    /// Every row of the pending query.
    pub fn query_all(&mut self) -> Result<Vec<Row>> {
        self.ensure_pending()?;
        Ok(self.conn.exec(&self.statement)?.all_rows())
    }

    /// First row of the pending query, or `None` for an empty result.
    pub fn query_one(&mut self) -> Result<Option<Row>> {
        self.ensure_pending()?;
        Ok(self.conn.exec(&self.statement)?.next_row())
    }

    /// First column of the first row, or `None` for an empty result.
    pub fn query_scalar(&mut self) -> Result<Option<Value>> {
        self.ensure_pending()?;
        Ok(self.conn.exec(&self.statement)?.scalar())
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.statement.is_empty() {
            return Err(Error::execution("no statement has been built"));
        }
        Ok(())
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Catalog column names of `table`; cached per table.
    pub fn columns_of(&mut self, table: &str) -> Result<Arc<[String]>> {
        self.conn.table_columns(table)
    }

    /// Inferred primary-key column of `table`; cached per table.
    pub fn primary_key_of(&mut self, table: &str) -> Result<String> {
        self.conn.table_primary_key(table)
    }

    /// Column names of the connection's selected table.
    pub fn columns(&mut self) -> Result<Arc<[String]>> {
        let table = self.conn.require_selected_table()?;
        self.columns_of(&table)
    }

    /// Primary key of the connection's selected table.
    pub fn primary_key(&mut self) -> Result<String> {
        let table = self.conn.require_selected_table()?;
        self.primary_key_of(&table)
    }

    /// Full catalog rows describing the columns of `table`. Not cached.
    pub fn column_data(&mut self, table: &str) -> Result<Vec<Row>> {
        Ok(self
            .conn
            .exec(&catalog::column_data_statement(table))?
            .all_rows())
    }

    /// [`Command::column_data`] reduced to [`ColumnInfo`].
    pub fn column_info(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        Ok(self
            .column_data(table)?
            .iter()
            .filter_map(ColumnInfo::from_row)
            .collect())
    }

    /// Every row of the `tables` catalog.
    pub fn tables(&mut self) -> Result<Vec<Row>> {
        Ok(self.conn.exec(&catalog::tables_statement())?.all_rows())
    }

    /// Table name for a catalog table id.
    pub fn table_name_by_id(&mut self, table_id: impl Into<Value>) -> Result<Option<String>> {
        Ok(self
            .conn
            .exec(&catalog::table_name_by_id_statement(table_id))?
            .scalar()
            .filter(|v| !v.is_null())
            .map(|v| v.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vertica_core::ConnectionConfig;

    /// Driver that is never expected to run anything.
    struct Idle;

    impl Driver for Idle {
        fn connect(&mut self, _: &ConnectionConfig) -> Result<()> {
            Ok(())
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn execute(&mut self, sql: &str, _: &[Value]) -> Result<u64> {
            Err(Error::execution_for(sql, "unexpected execute"))
        }
        fn query(&mut self, sql: &str, _: &[Value]) -> Result<Vec<Row>> {
            Err(Error::execution_for(sql, "unexpected query"))
        }
        fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }
        fn try_login(&mut self, _: &ConnectionConfig) -> Result<()> {
            Ok(())
        }
    }

    fn conn() -> Connection<Idle> {
        Connection::new(ConnectionConfig::new().dsn("test"), Idle)
    }

    #[test]
    fn test_build_insert_and_update() {
        let mut conn = conn();
        let mut cmd = conn.create_command();
        cmd.build_insert("customers", [("name", Value::from("Acme")), ("status", Value::from(1))])
            .unwrap();
        assert_eq!(
            cmd.raw_sql(),
            "INSERT INTO customers (name, status) VALUES ('Acme', 1)"
        );

        cmd.build_update("customers", "id", 5, [("id", Value::from(5)), ("name", Value::from("B"))])
            .unwrap();
        assert_eq!(cmd.raw_sql(), "UPDATE customers SET name='B' WHERE id=5");
    }

    #[test]
    fn test_build_delete_variants() {
        let mut conn = conn();
        let mut cmd = conn.create_command();
        cmd.build_delete("orders", [("customer_id", 3), ("status", 0)])
            .unwrap();
        assert_eq!(
            cmd.raw_sql(),
            "DELETE FROM orders WHERE customer_id=3 AND status=0"
        );

        cmd.set_statement(
            Statement::new("SELECT * FROM orders WHERE status=? ORDER BY id ASC LIMIT 5").bind(2),
        );
        cmd.build_delete_from_query().unwrap();
        assert_eq!(cmd.raw_sql(), "DELETE FROM orders WHERE status=2");

        cmd.set_sql("DROP TABLE orders");
        assert!(cmd.build_delete_from_query().is_err());
    }

    #[test]
    fn test_build_ddl() {
        let mut conn = conn();
        let mut cmd = conn.create_command();
        cmd.build_create_table("t", [("id", "INT"), ("name", "VARCHAR(10)")], Some("ORDER BY id"))
            .unwrap();
        assert_eq!(
            cmd.sql(),
            "CREATE TABLE t (\n\tid INT,\n\tname VARCHAR(10)\n) ORDER BY id"
        );
        cmd.build_drop_table("t").unwrap();
        assert_eq!(cmd.sql(), "DROP TABLE t");
    }

    #[test]
    fn test_build_counter_update() {
        let mut conn = conn();
        let mut cmd = conn.create_command();
        cmd.build_counter_update("posts", &[("views", 1)], &Condition::eq("id", 9))
            .unwrap();
        assert_eq!(cmd.raw_sql(), "UPDATE posts SET views=views+1 WHERE id=9");
    }

    #[test]
    fn test_execute_without_statement_fails() {
        let mut conn = conn();
        assert!(conn.create_command().execute().is_err());
    }

    #[test]
    fn test_columns_without_selected_table() {
        let mut conn = conn();
        assert!(matches!(
            conn.create_command().columns(),
            Err(Error::Configuration(_))
        ));
    }
}
