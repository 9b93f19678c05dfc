//! Migrations.
//!
//! A [`Migration`] is a named pair of `up`/`down` steps run through a
//! [`Migrator`]. There is no version table: callers decide which migrations
//! to apply.

use vertica_core::{Driver, Error, Result};
use vertica_schema::{CreateTable, DropTable};

use crate::connection::Connection;

/// One schema change.
pub trait Migration {
    fn name(&self) -> &str;

    fn up<D: Driver>(&self, migrator: &mut Migrator<'_, D>) -> Result<()>;

    fn down<D: Driver>(&self, _migrator: &mut Migrator<'_, D>) -> Result<()> {
        Err(Error::Unsupported(format!(
            "migration {} cannot be reverted",
            self.name()
        )))
    }
}

/// Runs migrations against a Vertica connection.
#[derive(Debug)]
pub struct Migrator<'c, D: Driver> {
    conn: &'c mut Connection<D>,
}

impl<'c, D: Driver> Migrator<'c, D> {
    /// Fails with [`Error::Configuration`] unless the connection is
    /// configured for Vertica.
    pub fn new(conn: &'c mut Connection<D>) -> Result<Self> {
        conn.config().validate()?;
        Ok(Self { conn })
    }

    pub fn connection(&mut self) -> &mut Connection<D> {
        self.conn
    }

    /// Run raw SQL.
    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        self.conn.execute(sql, &[])
    }

    pub fn create_table(&mut self, definition: &CreateTable) -> Result<()> {
        let statement = definition.build()?;
        self.conn.execute_statement(&statement)?;
        self.conn.schema_cache().invalidate(definition.table());
        tracing::info!(table = %definition.table(), "Created table");
        Ok(())
    }

    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        let statement = DropTable::new(table).build()?;
        self.conn.execute_statement(&statement)?;
        self.conn.schema_cache().invalidate(table);
        tracing::info!(table = %table, "Dropped table");
        Ok(())
    }

    /// Apply a migration.
    pub fn up<M: Migration>(&mut self, migration: &M) -> Result<()> {
        tracing::info!(migration = %migration.name(), "Applying migration");
        migration.up(self)
    }

    /// Revert a migration.
    pub fn down<M: Migration>(&mut self, migration: &M) -> Result<()> {
        tracing::info!(migration = %migration.name(), "Reverting migration");
        migration.down(self)
    }
}
