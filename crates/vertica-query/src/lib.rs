//! Query building for Vertica Record.
//!
//! `vertica-query` turns structured input into [`Statement`]s: SQL text with
//! `?` placeholders plus the values to bind.
//!
//! # Role In The Architecture
//!
//! - **Conditions**: [`Condition`] trees compile to WHERE clauses.
//! - **SELECT**: [`Query`] is an owned specification; [`QueryBuilder`]
//!   compiles it.
//! - **DML**: [`InsertBuilder`], [`UpdateBuilder`], [`DeleteBuilder`] and
//!   [`CounterUpdateBuilder`] produce write statements.
//!
//! Every table, column and select-list name is validated against the
//! identifier rules in `vertica-core` before it reaches SQL text.
//!
//! [`Statement`]: vertica_core::Statement

pub mod builder;
pub mod condition;
pub mod query;
pub mod select;

pub use builder::{CounterUpdateBuilder, DeleteBuilder, InsertBuilder, UpdateBuilder};
pub use condition::{CompareOp, Condition};
pub use query::{Direction, OrderBy, Query, SelectItem};
pub use select::QueryBuilder;
