//! ODBC driver for Vertica Record.
//!
//! [`OdbcOptions`] builds ODBC connection strings from a
//! [`ConnectionConfig`](vertica_core::ConnectionConfig). With the `odbc`
//! feature enabled, [`OdbcDriver`] implements the blocking
//! [`Driver`](vertica_core::Driver) contract through `odbc-api`, which links
//! against the system driver manager.
//!
//! ```ignore
//! use vertica_odbc::OdbcDriver;
//! use vertica_record::{Connection, ConnectionConfig};
//!
//! let config = ConnectionConfig::new().dsn("VerticaDSN").username("dbadmin");
//! let mut conn = Connection::new(config, OdbcDriver::new());
//! let name = conn.database_name()?;
//! ```

pub mod options;
pub mod types;

#[cfg(feature = "odbc")]
pub mod driver;

#[cfg(feature = "odbc")]
pub use driver::OdbcDriver;
pub use options::OdbcOptions;
pub use types::ColumnKind;
