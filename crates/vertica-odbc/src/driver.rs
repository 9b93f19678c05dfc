//! [`Driver`] implementation on top of `odbc-api`.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use odbc_api::parameter::{InputParameter, VarCharBox};
use odbc_api::{Bit, ConnectionOptions, Cursor, DataType, Environment, IntoParameter};
use vertica_core::{
    ConnectionConfig, ConnectionError, ConnectionErrorKind, Driver, Error, ExecutionError, Result,
    Row, Value,
};

use crate::options::OdbcOptions;
use crate::types::ColumnKind;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// The process-wide ODBC environment, allocated on first use.
fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new()
        .map_err(|e| connection_error("failed to allocate ODBC environment", e))?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

fn connection_error(message: &str, err: odbc_api::Error) -> Error {
    let text = err.to_string();
    // SQLSTATE 28000: invalid authorization specification
    let kind = if text.contains("28000") {
        ConnectionErrorKind::Authentication
    } else {
        ConnectionErrorKind::Connect
    };
    Error::Connection(ConnectionError {
        kind,
        message: format!("{message}: {text}"),
        source: Some(Box::new(err)),
    })
}

fn execution_error(sql: &str, err: odbc_api::Error) -> Error {
    Error::Execution(ExecutionError {
        sql: Some(sql.to_string()),
        message: err.to_string(),
        source: Some(Box::new(err)),
    })
}

/// Blocking Vertica driver over an ODBC driver manager.
#[derive(Default)]
pub struct OdbcDriver {
    connection: Option<odbc_api::Connection<'static>>,
}

impl std::fmt::Debug for OdbcDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcDriver")
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl OdbcDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(config: &ConnectionConfig) -> Result<odbc_api::Connection<'static>> {
        let options = OdbcOptions::from_config(config);
        tracing::debug!(connection_string = %options.redacted(), "Connecting through ODBC");
        environment()?
            .connect_with_connection_string(&options.build(), ConnectionOptions::default())
            .map_err(|e| connection_error("failed to connect", e))
    }

    fn handle(&self) -> Result<&odbc_api::Connection<'static>> {
        self.connection.as_ref().ok_or_else(|| {
            Error::connection(ConnectionErrorKind::NotOpen, "the ODBC handle is not open")
        })
    }
}

impl Driver for OdbcDriver {
    fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        if self.connection.is_none() {
            self.connection = Some(Self::open(config)?);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let start = Instant::now();
        let params = bind_params(params);
        let mut statement = self
            .handle()?
            .preallocate()
            .map_err(|e| execution_error(sql, e))?;
        statement
            .execute(sql, params.as_slice())
            .map_err(|e| execution_error(sql, e))?;
        let affected = statement
            .row_count()
            .map_err(|e| execution_error(sql, e))?
            .map_or(0, |n| n as u64);
        tracing::trace!(
            rows = affected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ODBC execute finished"
        );
        Ok(affected)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let start = Instant::now();
        let params = bind_params(params);
        let cursor = self
            .handle()?
            .execute(sql, params.as_slice(), None)
            .map_err(|e| execution_error(sql, e))?;
        let rows = match cursor {
            Some(mut cursor) => read_rows(&mut cursor).map_err(|e| execution_error(sql, e))?,
            None => Vec::new(),
        };
        tracing::trace!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ODBC query finished"
        );
        Ok(rows)
    }

    fn disconnect(&mut self) -> Result<()> {
        // Dropping the connection releases the ODBC handle.
        self.connection = None;
        Ok(())
    }

    fn try_login(&mut self, config: &ConnectionConfig) -> Result<()> {
        Self::open(config).map(drop)
    }
}

fn bind_params(params: &[Value]) -> Vec<Box<dyn InputParameter>> {
    params
        .iter()
        .map(|value| -> Box<dyn InputParameter> {
            match value {
                Value::Null => Box::new(VarCharBox::null()),
                Value::Bool(b) => Box::new(Bit::from_bool(*b)),
                Value::BigInt(v) => Box::new(*v),
                Value::Double(v) => Box::new(*v),
                Value::Decimal(s) | Value::Text(s) => Box::new(s.clone().into_parameter()),
            }
        })
        .collect()
}

fn column_kind(data_type: &DataType) -> ColumnKind {
    match data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
            ColumnKind::Integer
        }
        DataType::Bit => ColumnKind::Boolean,
        DataType::Real | DataType::Double | DataType::Float { .. } => ColumnKind::Float,
        DataType::Decimal { .. } | DataType::Numeric { .. } => ColumnKind::Decimal,
        _ => ColumnKind::Text,
    }
}

fn read_rows(cursor: &mut impl Cursor) -> std::result::Result<Vec<Row>, odbc_api::Error> {
    let count = u16::try_from(cursor.num_result_cols()?).unwrap_or(0);
    let mut names = Vec::with_capacity(usize::from(count));
    let mut kinds = Vec::with_capacity(usize::from(count));
    for index in 1..=count {
        names.push(cursor.col_name(index)?);
        kinds.push(column_kind(&cursor.col_data_type(index)?));
    }
    let columns: Arc<[String]> = names.into();

    let mut rows = Vec::new();
    let mut buffer = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        let mut values = Vec::with_capacity(kinds.len());
        for (index, kind) in (1..=count).zip(&kinds) {
            let present = row.get_text(index, &mut buffer)?;
            values.push(if present {
                kind.parse(&buffer)
            } else {
                Value::Null
            });
        }
        rows.push(Row::new(Arc::clone(&columns), values));
    }
    Ok(rows)
}
