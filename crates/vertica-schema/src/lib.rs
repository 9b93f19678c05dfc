//! Schema support for Vertica Record.
//!
//! - [`catalog`]: statements against Vertica's system catalog and the
//!   interpretation of their rows, including primary-key inference.
//! - [`cache`]: [`SchemaCache`], the shared per-table cache of column lists
//!   and primary keys.
//! - [`ddl`]: [`CreateTable`] and [`DropTable`].

pub mod cache;
pub mod catalog;
pub mod ddl;

pub use cache::{CacheStats, SchemaCache};
pub use catalog::{ColumnInfo, infer_primary_key, parse_columns};
pub use ddl::{CreateTable, DropTable};
