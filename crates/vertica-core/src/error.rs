//! Error types shared by every crate in the workspace.

use std::fmt;

use crate::value::Value;

/// Result alias used throughout Vertica Record.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error source coming from a driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The primary error type.
#[derive(Debug)]
pub enum Error {
    /// Missing or wrong configuration, e.g. a non-Vertica component.
    Configuration(String),
    /// The driver could not establish or keep a connection.
    Connection(ConnectionError),
    /// A statement failed to execute.
    Execution(ExecutionError),
    /// One or more per-key operations of a bulk statement failed.
    Bulk(BulkError),
    /// The operation cannot be expressed against this storage model.
    Unsupported(String),
    /// A table, column or counter name failed identifier validation.
    InvalidIdentifier(String),
}

/// What kind of connection failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The driver manager refused the connect call.
    Connect,
    /// The credentials were rejected.
    Authentication,
    /// An operation needed an open handle but the connection was closed.
    NotOpen,
    /// Closing the handle failed.
    Disconnect,
}

/// Details of a connection failure.
#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<BoxError>,
}

/// Details of a failed statement.
#[derive(Debug)]
pub struct ExecutionError {
    /// Rendered SQL of the failing statement, if known.
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<BoxError>,
}

/// One failed item of a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    /// Primary key value the operation was issued for.
    pub key: Value,
    pub message: String,
}

/// Aggregate of every failed item of a bulk per-key operation.
///
/// Every key is attempted before this error is raised, so `affected` counts
/// the rows changed by the successful items.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkError {
    pub operation: &'static str,
    pub table: String,
    pub failures: Vec<BulkFailure>,
    pub affected: u64,
}

impl BulkError {
    /// Keys of the failed items, in the order they were attempted.
    pub fn failed_keys(&self) -> Vec<&Value> {
        self.failures.iter().map(|f| &f.key).collect()
    }
}

impl Error {
    /// Shorthand for an execution error carrying only a message.
    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution(ExecutionError {
            sql: None,
            message: message.into(),
            source: None,
        })
    }

    /// Execution error attached to the statement that failed.
    pub fn execution_for(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Execution(ExecutionError {
            sql: Some(sql.into()),
            message: message.into(),
            source: None,
        })
    }

    /// Connection error without an underlying source.
    pub fn connection(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        Error::Connection(ConnectionError {
            kind,
            message: message.into(),
            source: None,
        })
    }

    /// Whether this error came from the connection layer.
    pub const fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Attach the rendered SQL to an execution error that lacks it.
    #[must_use]
    pub fn with_sql(self, sql: impl Into<String>) -> Self {
        match self {
            Error::Execution(mut e) if e.sql.is_none() => {
                e.sql = Some(sql.into());
                Error::Execution(e)
            }
            other => other,
        }
    }
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionErrorKind::Connect => "connect",
            ConnectionErrorKind::Authentication => "authentication",
            ConnectionErrorKind::NotOpen => "not open",
            ConnectionErrorKind::Disconnect => "disconnect",
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Error::Connection(e) => write!(f, "connection error ({}): {}", e.kind, e.message),
            Error::Execution(e) => match &e.sql {
                Some(sql) => write!(f, "execution error: {} [sql: {sql}]", e.message),
                None => write!(f, "execution error: {}", e.message),
            },
            Error::Bulk(e) => {
                write!(
                    f,
                    "{} on {} failed for {} key(s):",
                    e.operation,
                    e.table,
                    e.failures.len()
                )?;
                for failure in &e.failures {
                    write!(f, " [{}: {}]", failure.key, failure.message)?;
                }
                Ok(())
            }
            Error::Unsupported(msg) => write!(f, "unsupported operation: {msg}"),
            Error::InvalidIdentifier(name) => write!(f, "invalid identifier: {name:?}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source = match self {
            Error::Connection(e) => e.source.as_ref(),
            Error::Execution(e) => e.source.as_ref(),
            _ => None,
        };
        source.map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
