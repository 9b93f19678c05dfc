//! SELECT compilation.

use vertica_core::{
    Error, Result, Statement, Value, quote_value, validate_field, validate_identifier,
};

use crate::condition::Condition;
use crate::query::{Query, SelectItem};

/// Compiles [`Query`] specifications into SELECT statements.
///
/// Stateless; a single value can be shared by every query on a connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build `SELECT <fields> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT n] [OFFSET m]`.
    pub fn build(&self, query: &Query) -> Result<Statement> {
        let fields = if query.fields().is_empty() {
            "*".to_string()
        } else {
            query
                .fields()
                .iter()
                .map(|item| match item {
                    SelectItem::Field(field) => {
                        validate_field(field).map(|f| f.trim().to_string())
                    }
                    SelectItem::Expr { expr, alias } => validate_identifier(alias)
                        .map(|alias| format!("{} AS {alias}", expr.trim())),
                })
                .collect::<Result<Vec<_>>>()?
                .join(", ")
        };
        self.build_with_fields(query, &fields, true)
    }

    /// Build `SELECT COUNT(*) FROM <table> [WHERE ..]`, ignoring ordering and paging.
    pub fn build_count(&self, query: &Query) -> Result<Statement> {
        self.build_with_fields(query, "COUNT(*)", false)
    }

    /// Build `DELETE FROM <table> [WHERE ..]` from the query's table and condition.
    ///
    /// Queries with ORDER BY, LIMIT or OFFSET are rejected: Vertica's DELETE
    /// cannot express them.
    pub fn build_delete(&self, query: &Query) -> Result<Statement> {
        if !query.order().is_empty()
            || query.limit_value().is_some()
            || query.offset_value().is_some()
        {
            return Err(Error::Unsupported(format!(
                "DELETE on {} cannot honor ORDER BY, LIMIT or OFFSET",
                query.table()
            )));
        }
        let mut sql = format!("DELETE FROM {}", validate_identifier(query.table())?);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params, query.condition())?;
        Ok(Statement::with_params(sql, params))
    }

    /// Compile a bare condition into `(sql, params)`.
    pub fn build_condition(&self, condition: &Condition) -> Result<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let sql = condition.build(&mut params)?;
        Ok((sql, params))
    }

    /// Escaped SQL literal for a value.
    pub fn quote_value(&self, value: &Value) -> String {
        quote_value(value)
    }

    fn build_with_fields(&self, query: &Query, fields: &str, paging: bool) -> Result<Statement> {
        let mut sql = format!(
            "SELECT {fields} FROM {}",
            validate_identifier(query.table())?
        );
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params, query.condition())?;

        if paging {
            if !query.order().is_empty() {
                let terms = query
                    .order()
                    .iter()
                    .map(|o| {
                        validate_identifier(&o.column)
                            .map(|c| format!("{c} {}", o.direction.as_sql()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                sql.push_str(" ORDER BY ");
                sql.push_str(&terms.join(", "));
            }
            if let Some(limit) = query.limit_value() {
                sql.push_str(&format!(" LIMIT {limit}"));
            }
            if let Some(offset) = query.offset_value() {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        tracing::trace!(sql = %sql, params = params.len(), "Compiled query");
        Ok(Statement::with_params(sql, params))
    }

    fn append_where(
        &self,
        sql: &mut String,
        params: &mut Vec<Value>,
        condition: Option<&Condition>,
    ) -> Result<()> {
        if let Some(condition) = condition.filter(|c| !c.is_empty()) {
            let where_sql = condition.build(params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        Ok(())
    }
}
