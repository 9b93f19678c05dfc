//! Active-record data access for Vertica over ODBC.
//!
//! `vertica-record` is the facade crate. It ties the driver contract, the
//! query builders and the schema cache together into a connection, a
//! command object and an ActiveRecord-style API.
//!
//! # Role In The Architecture
//!
//! - **Connection**: [`Connection`] owns one blocking driver handle, opened
//!   lazily, and the shared [`SchemaCache`].
//! - **Commands**: [`Command`] builds and runs one pending statement.
//! - **Records**: types implementing [`ActiveRecord`] get finders,
//!   persistence, bulk operations and relation loading.
//! - **Queries**: [`ActiveQuery`] is the fluent query returned by
//!   [`ActiveRecord::find`]; [`ArrayQuery`] returns raw rows.
//!
//! Everything is synchronous: each call blocks until the driver returns.
//!
//! # Example
//!
//! ```ignore
//! use vertica_record::prelude::*;
//!
//! let config = ConnectionConfig::new().dsn("VerticaDSN").username("dbadmin");
//! let mut conn = Connection::new(config, OdbcDriver::new());
//!
//! let customer = Customer::find_by_pk(&mut conn, 42)?;
//! ```

pub mod active_query;
pub mod active_record;
pub mod command;
pub mod connection;
pub mod cursor;
pub mod migration;
pub mod record;
pub mod relation;

pub use active_query::{ActiveQuery, ArrayQuery};
pub use active_record::ActiveRecord;
pub use command::Command;
pub use connection::Connection;
pub use cursor::Cursor;
pub use migration::{Migration, Migrator};
pub use record::{Record, RecordState, Related};
pub use relation::{Multiplicity, Relation};

pub use vertica_core::{
    BulkError, BulkFailure, ConnectionConfig, ConnectionError, ConnectionErrorKind, Driver, Error,
    ExecutionError, Result, Row, Statement, Value,
};
#[cfg(feature = "odbc")]
pub use vertica_odbc::OdbcDriver;
pub use vertica_odbc::OdbcOptions;
pub use vertica_query::{Condition, Direction, Query, QueryBuilder};
pub use vertica_schema::{CacheStats, ColumnInfo, CreateTable, DropTable, SchemaCache};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        ActiveQuery, ActiveRecord, ArrayQuery, Command, Condition, Connection, ConnectionConfig,
        CreateTable, Direction, Driver, Error, Migration, Migrator, Record, Related, Relation,
        Result, Row, SchemaCache, Value,
    };
    #[cfg(feature = "odbc")]
    pub use crate::OdbcDriver;
}
