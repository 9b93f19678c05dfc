//! Connection to a Vertica database through a [`Driver`].
//!
//! A `Connection` owns one driver handle, opened lazily on the first
//! statement and reused until [`Connection::close`]. It also carries the
//! [`SchemaCache`] used for catalog lookups, which can be shared between
//! connections.
//!
//! # Example
//!
//! ```ignore
//! let config = ConnectionConfig::new().dsn("VerticaDSN").username("dbadmin");
//! let mut conn = Connection::new(config, OdbcDriver::new());
//!
//! let total = conn.query("SELECT COUNT(*) FROM customers", &[])?.scalar();
//! let pk = conn.table_primary_key("customers")?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use vertica_core::{
    ConnectionConfig, Driver, Error, Result, Statement, Value, validate_identifier,
};
use vertica_query::QueryBuilder;
use vertica_schema::{SchemaCache, catalog};

use crate::command::Command;
use crate::cursor::Cursor;

/// A lazily opened connection.
pub struct Connection<D: Driver> {
    config: ConnectionConfig,
    driver: D,
    schema: Arc<SchemaCache>,
    builder: QueryBuilder,
    selected_table: Option<String>,
    database_name: Option<String>,
}

impl<D: Driver> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("dsn", &self.config.dsn)
            .field("driver", &self.driver.name())
            .field("active", &self.driver.is_connected())
            .field("selected_table", &self.selected_table)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Connection<D> {
    /// Create a closed connection with its own schema cache.
    pub fn new(config: ConnectionConfig, driver: D) -> Self {
        Self {
            config,
            driver,
            schema: SchemaCache::shared(),
            builder: QueryBuilder::new(),
            selected_table: None,
            database_name: None,
        }
    }

    /// Use a shared schema cache instead of a private one.
    pub fn with_schema_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.schema = cache;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.schema
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The SELECT compiler for this connection.
    pub fn query_builder(&self) -> QueryBuilder {
        self.builder
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the handle if it is not open yet, then run the configured
    /// init statements.
    #[tracing::instrument(level = "debug", skip(self), fields(dsn = %self.config.dsn))]
    pub fn open(&mut self) -> Result<()> {
        if self.driver.is_connected() {
            return Ok(());
        }
        self.config.validate()?;

        let start = Instant::now();
        self.driver.connect(&self.config)?;
        tracing::info!(
            driver = self.driver.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Connection opened"
        );

        for sql in self.config.init_statements.clone() {
            tracing::debug!(sql = %sql, "Running init statement");
            if let Err(e) = self.driver.execute(&sql, &[]) {
                // A half-initialized session must not be reused by the next call.
                if let Err(close_err) = self.driver.disconnect() {
                    tracing::warn!(error = %close_err, "Disconnect after failed init statement failed");
                }
                return Err(e.with_sql(sql.as_str()));
            }
        }
        Ok(())
    }

    /// Release the handle. Closing a closed connection does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.driver.is_connected() {
            self.driver.disconnect()?;
            tracing::info!("Connection closed");
        }
        Ok(())
    }

    /// Whether the handle is open.
    pub fn is_active(&self) -> bool {
        self.driver.is_connected()
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Try the given credentials on a throw-away handle.
    ///
    /// Returns `None` when they work, otherwise the driver's error message.
    /// This connection's own handle is not touched.
    pub fn check_credentials(
        &mut self,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Option<String> {
        let trial = ConnectionConfig::new()
            .component(self.config.component.clone())
            .dsn(dsn)
            .username(username)
            .password(password);
        match trial.validate().and_then(|()| self.driver.try_login(&trial)) {
            Ok(()) => None,
            Err(e) => {
                tracing::debug!(dsn = %dsn, error = %e, "Credential check failed");
                Some(e.to_string())
            }
        }
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run a statement that returns no rows; returns the affected row count.
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.execute_statement(&Statement::with_params(sql, params.to_vec()))
    }

    /// Run a prepared [`Statement`] that returns no rows.
    pub fn execute_statement(&mut self, statement: &Statement) -> Result<u64> {
        self.open()?;
        let start = Instant::now();
        let affected = self
            .driver
            .execute(statement.sql(), statement.params())
            .map_err(|e| e.with_sql(statement.render()))?;
        tracing::debug!(
            sql = %statement,
            rows = affected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Executed statement"
        );
        Ok(affected)
    }

    /// Run a statement and fetch its result set.
    pub fn exec(&mut self, statement: &Statement) -> Result<Cursor> {
        self.open()?;
        let start = Instant::now();
        let rows = self
            .driver
            .query(statement.sql(), statement.params())
            .map_err(|e| e.with_sql(statement.render()))?;
        tracing::debug!(
            sql = %statement,
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched result set"
        );
        Ok(Cursor::new(rows))
    }

    /// Run raw SQL with parameters and fetch its result set.
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Cursor> {
        self.exec(&Statement::with_params(sql, params.to_vec()))
    }

    /// A command bound to this connection.
    pub fn create_command(&mut self) -> Command<'_, D> {
        Command::new(self)
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// The table catalog lookups default to.
    pub fn selected_table(&self) -> Option<&str> {
        self.selected_table.as_deref()
    }

    pub fn select_table(&mut self, table: impl Into<String>) {
        self.selected_table = Some(table.into());
    }

    /// Name of the connected database, read once per connection.
    pub fn database_name(&mut self) -> Result<String> {
        if let Some(name) = &self.database_name {
            return Ok(name.clone());
        }
        let name = self
            .exec(&catalog::database_name_statement())?
            .scalar()
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.database_name = Some(name.clone());
        Ok(name)
    }

    /// Catalog column names of `table`, through the schema cache.
    pub fn table_columns(&mut self, table: &str) -> Result<Arc<[String]>> {
        let cache = Arc::clone(&self.schema);
        cache.columns_or_load(table, || {
            let rows = self.exec(&catalog::columns_statement(table))?.all_rows();
            Ok(catalog::parse_columns(&rows))
        })
    }

    /// Inferred primary-key column of `table` (empty when there is none),
    /// through the schema cache.
    pub fn table_primary_key(&mut self, table: &str) -> Result<String> {
        let cache = Arc::clone(&self.schema);
        cache.primary_key_or_load(table, || {
            let rows = self.exec(&catalog::primary_key_statement(table))?.all_rows();
            let pk = catalog::infer_primary_key(&rows);
            tracing::debug!(table = %table, primary_key = %pk, "Inferred primary key");
            Ok(pk)
        })
    }

    /// Validate a table name for use in SQL text. Names are not quoted.
    pub fn quote_table_name<'a>(&self, name: &'a str) -> Result<&'a str> {
        validate_identifier(name)
    }

    /// Validate a column name for use in SQL text. Names are not quoted.
    pub fn quote_column_name<'a>(&self, name: &'a str) -> Result<&'a str> {
        if name == "*" {
            return Ok(name);
        }
        validate_identifier(name)
    }

    /// The selected table, or a configuration error when none is set.
    pub(crate) fn require_selected_table(&self) -> Result<String> {
        self.selected_table
            .clone()
            .ok_or_else(|| Error::Configuration("no table is selected".to_string()))
    }
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to close connection");
        }
    }
}
