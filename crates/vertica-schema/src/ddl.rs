//! CREATE TABLE / DROP TABLE generation.
//!
//! Column types and constraint clauses are written verbatim; only table and
//! column names are validated.

use vertica_core::{Result, Statement, validate_identifier};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TableItem {
    Column { name: String, definition: String },
    Constraint(String),
}

/// CREATE TABLE builder.
///
/// ```
/// use vertica_schema::CreateTable;
///
/// let stmt = CreateTable::new("customers")
///     .column("id", "IDENTITY(1,1)")
///     .column("name", "VARCHAR(80) NOT NULL")
///     .constraint("PRIMARY KEY (id)")
///     .build()
///     .unwrap();
/// assert_eq!(
///     stmt.sql(),
///     "CREATE TABLE customers (\n\tid IDENTITY(1,1),\n\tname VARCHAR(80) NOT NULL,\n\tPRIMARY KEY (id)\n)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    table: String,
    items: Vec<TableItem>,
    options: Option<String>,
}

impl CreateTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            items: Vec::new(),
            options: None,
        }
    }

    /// Add a column with its type and modifiers.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.items.push(TableItem::Column {
            name: name.into(),
            definition: definition.into(),
        });
        self
    }

    /// Add a table-level clause such as `PRIMARY KEY (id)`.
    #[must_use]
    pub fn constraint(mut self, clause: impl Into<String>) -> Self {
        self.items.push(TableItem::Constraint(clause.into()));
        self
    }

    /// Text appended after the column list, e.g. `ORDER BY id SEGMENTED BY HASH(id) ALL NODES`.
    #[must_use]
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn build(&self) -> Result<Statement> {
        let table = validate_identifier(&self.table)?;
        let lines = self
            .items
            .iter()
            .map(|item| match item {
                TableItem::Column { name, definition } => {
                    validate_identifier(name).map(|n| format!("\t{n} {definition}"))
                }
                TableItem::Constraint(clause) => Ok(format!("\t{clause}")),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sql = format!("CREATE TABLE {table} (\n{}\n)", lines.join(",\n"));
        if let Some(options) = &self.options {
            sql.push(' ');
            sql.push_str(options);
        }
        tracing::debug!(table = %table, columns = self.items.len(), "Generating CREATE TABLE");
        Ok(Statement::new(sql))
    }
}

/// DROP TABLE builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    table: String,
    if_exists: bool,
    cascade: bool,
}

impl DropTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            if_exists: false,
            cascade: false,
        }
    }

    #[must_use]
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Also drop dependent projections and views.
    #[must_use]
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn build(&self) -> Result<Statement> {
        let table = validate_identifier(&self.table)?;
        let mut sql = String::from("DROP TABLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(table);
        if self.cascade {
            sql.push_str(" CASCADE");
        }
        Ok(Statement::new(sql))
    }
}
