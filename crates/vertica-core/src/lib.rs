//! Core types and traits for Vertica Record.
//!
//! `vertica-core` is the **foundation layer** for the workspace. It defines the
//! data types and the driver contract every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Driver` is the blocking call interface implemented by
//!   the ODBC driver (`vertica-odbc`) and by test doubles.
//! - **Data model**: `Value`, `Row` and `Statement` represent query inputs and
//!   outputs and are shared across the query, schema and record crates.
//! - **Safety**: `literal` and `identifiers` hold the escaping and validation
//!   rules for everything spliced into SQL text.
//!
//! # Who Uses This Crate
//!
//! - `vertica-query` compiles `Condition`s and builders into `Statement`s.
//! - `vertica-schema` reads catalog `Row`s.
//! - `vertica-record` drives a `Driver` through its `Connection`.
//!
//! Most applications should use the `vertica-record` facade.

pub mod config;
pub mod driver;
pub mod error;
pub mod identifiers;
pub mod literal;
pub mod row;
pub mod statement;
pub mod value;

pub use config::{ConnectionConfig, VERTICA_COMPONENT};
pub use driver::Driver;
pub use error::{
    BoxError, BulkError, BulkFailure, ConnectionError, ConnectionErrorKind, Error,
    ExecutionError, Result,
};
pub use identifiers::{is_valid_identifier, validate_field, validate_identifier};
pub use literal::{quote_str, quote_value};
pub use row::Row;
pub use statement::{Statement, render_sql};
pub use value::Value;
