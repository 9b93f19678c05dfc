//! Vertica system catalog queries.
//!
//! Builds the statements that read `v_catalog.columns`, `v_catalog.tables`
//! and `v_catalog.databases`, and interprets their rows.

use serde::{Deserialize, Serialize};
use vertica_core::{Row, Statement, Value};

/// `SELECT column_name FROM COLUMNS WHERE table_name=?`
pub fn columns_statement(table: &str) -> Statement {
    Statement::new("SELECT column_name FROM COLUMNS WHERE table_name=?").bind(table)
}

/// `SELECT is_identity, column_name, data_type FROM COLUMNS WHERE table_name=?`
pub fn primary_key_statement(table: &str) -> Statement {
    Statement::new("SELECT is_identity, column_name, data_type FROM COLUMNS WHERE table_name=?")
        .bind(table)
}

/// Full column metadata for one table.
pub fn column_data_statement(table: &str) -> Statement {
    Statement::new("SELECT * FROM COLUMNS WHERE table_name=?").bind(table)
}

/// Every table in the catalog.
pub fn tables_statement() -> Statement {
    Statement::new("SELECT * FROM tables")
}

/// Name of the current database.
pub fn database_name_statement() -> Statement {
    Statement::new("SELECT database_name FROM databases")
}

/// Resolve a table name from its catalog id.
pub fn table_name_by_id_statement(table_id: impl Into<Value>) -> Statement {
    Statement::new("SELECT table_name FROM tables WHERE table_id=?").bind(table_id)
}

/// Column names in catalog order, from rows of [`columns_statement`].
pub fn parse_columns(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| {
            row.get_named("column_name")
                .or_else(|| row.get(0))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .collect()
}

/// Infer the primary-key column from rows of [`primary_key_statement`].
///
/// The first identity column wins. Without one, the first column typed
/// `int` is used. Returns an empty string when neither exists.
pub fn infer_primary_key(rows: &[Row]) -> String {
    let mut primary_key = String::new();
    for row in rows {
        let Some(name) = row.get_named("column_name").and_then(Value::as_str) else {
            continue;
        };
        if row.get_named("is_identity").is_some_and(Value::is_truthy) {
            return name.to_string();
        }
        let is_int = row
            .get_named("data_type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case("int"));
        if primary_key.is_empty() && is_int {
            primary_key = name.to_string();
        }
    }
    primary_key
}

/// One row of `v_catalog.columns`, reduced to the fields the adapter reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub table_schema: Option<String>,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub column_default: Option<String>,
    pub ordinal_position: Option<i64>,
}

impl ColumnInfo {
    /// Read a catalog row; `None` if it lacks a column name.
    pub fn from_row(row: &Row) -> Option<Self> {
        let text = |name: &str| {
            row.get_named(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Some(Self {
            column_name: text("column_name")?,
            table_schema: text("table_schema"),
            table_name: text("table_name").unwrap_or_default(),
            data_type: text("data_type").unwrap_or_default(),
            is_nullable: row.get_named("is_nullable").is_some_and(Value::is_truthy),
            is_identity: row.get_named("is_identity").is_some_and(Value::is_truthy),
            column_default: text("column_default"),
            ordinal_position: row.get_named("ordinal_position").and_then(Value::as_i64),
        })
    }
}
