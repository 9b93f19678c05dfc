//! The driver contract.
//!
//! A `Driver` is the blocking call interface underneath a connection:
//! connect, execute, fetch. The ODBC implementation lives in `vertica-odbc`;
//! tests use scripted in-memory drivers.

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::row::Row;
use crate::value::Value;

/// Blocking database call interface.
///
/// Every method blocks the calling thread until the underlying call returns.
/// Implementations do not retry and do not time out.
pub trait Driver {
    /// Short driver name used in logs.
    fn name(&self) -> &'static str {
        "vertica"
    }

    /// Open the handle described by `config`.
    fn connect(&mut self, config: &ConnectionConfig) -> Result<()>;

    /// Whether a handle is currently open.
    fn is_connected(&self) -> bool;

    /// Run a statement that produces no result set, returning the affected
    /// row count when the driver reports one.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run a statement and fetch its whole result set.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Release the handle. Closing a closed driver is a no-op.
    fn disconnect(&mut self) -> Result<()>;

    /// Try to connect with `config` on a separate, throw-away handle.
    fn try_login(&mut self, config: &ConnectionConfig) -> Result<()>;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        (**self).connect(config)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }

    fn try_login(&mut self, config: &ConnectionConfig) -> Result<()> {
        (**self).try_login(config)
    }
}
