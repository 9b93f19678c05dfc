//! Scripted in-memory driver shared by the integration tests.

#![allow(dead_code)]

use vertica_record::prelude::*;
use vertica_record::{ConnectionErrorKind, Statement};

/// Driver that records every statement and answers from a script.
///
/// Statements are matched on their rendered SQL: the latest response whose
/// text is a prefix of the statement wins. Unmatched queries return no rows;
/// unmatched executes report one affected row.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    connected: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub login_attempts: Vec<String>,
    log: Vec<String>,
    responses: Vec<(String, Vec<Row>)>,
    affected: Vec<(String, u64)>,
    failures: Vec<String>,
    refuse_connect: Option<String>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned for statements starting with `sql`.
    pub fn respond(mut self, sql: &str, rows: Vec<Row>) -> Self {
        self.responses.push((sql.to_string(), rows));
        self
    }

    /// Affected-row count reported for statements starting with `sql`.
    pub fn affect(mut self, sql: &str, rows: u64) -> Self {
        self.affected.push((sql.to_string(), rows));
        self
    }

    /// Fail every statement whose rendered SQL equals `sql`.
    pub fn fail_on(mut self, sql: &str) -> Self {
        self.failures.push(sql.to_string());
        self
    }

    pub fn refuse_connect(mut self, message: &str) -> Self {
        self.refuse_connect = Some(message.to_string());
        self
    }

    /// Script both catalog lookups for `table`.
    ///
    /// Columns are `(name, data_type, is_identity)`.
    pub fn catalog(self, table: &str, columns: &[(&str, &str, bool)]) -> Self {
        let names = columns
            .iter()
            .map(|(name, _, _)| Row::from_pairs([("column_name", *name)]))
            .collect();
        let pk_rows = columns
            .iter()
            .map(|(name, data_type, identity)| {
                Row::from_pairs([
                    ("is_identity", Value::Bool(*identity)),
                    ("column_name", Value::from(*name)),
                    ("data_type", Value::from(*data_type)),
                ])
            })
            .collect();
        self.respond(
            &format!("SELECT column_name FROM COLUMNS WHERE table_name='{table}'"),
            names,
        )
        .respond(
            &format!(
                "SELECT is_identity, column_name, data_type FROM COLUMNS WHERE table_name='{table}'"
            ),
            pk_rows,
        )
    }

    /// Rendered SQL of every statement run, in order.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Statements run that start with `prefix`.
    pub fn statements_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.log
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    /// Log entries that are not catalog lookups.
    pub fn data_statements(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter(|sql| !sql.contains(" FROM COLUMNS "))
            .map(String::as_str)
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn record(&mut self, sql: &str, params: &[Value]) -> Result<String> {
        if !self.connected {
            return Err(Error::connection(
                ConnectionErrorKind::NotOpen,
                "statement sent before connect",
            ));
        }
        let rendered = Statement::with_params(sql, params.to_vec()).render();
        self.log.push(rendered.clone());
        if self.failures.iter().any(|f| *f == rendered) {
            return Err(Error::execution_for(rendered, "scripted failure"));
        }
        Ok(rendered)
    }
}

impl Driver for ScriptedDriver {
    fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        if let Some(message) = &self.refuse_connect {
            return Err(Error::connection(
                ConnectionErrorKind::Connect,
                format!("{}: {message}", config.dsn),
            ));
        }
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let rendered = self.record(sql, params)?;
        Ok(self
            .affected
            .iter()
            .rev()
            .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
            .map_or(1, |(_, rows)| *rows))
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let rendered = self.record(sql, params)?;
        Ok(self
            .responses
            .iter()
            .rev()
            .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        self.disconnects += 1;
        Ok(())
    }

    fn try_login(&mut self, config: &ConnectionConfig) -> Result<()> {
        self.login_attempts.push(config.dsn.clone());
        if config.password.as_deref() == Some("wrong") {
            return Err(Error::connection(
                ConnectionErrorKind::Authentication,
                "authentication failed",
            ));
        }
        Ok(())
    }
}

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new()
        .dsn("VerticaDSN")
        .username("dbadmin")
        .password("secret")
}

pub fn connect(driver: ScriptedDriver) -> Connection<ScriptedDriver> {
    Connection::new(config(), driver)
}

/// Customer rows: `id` identity, `name`, `status`, `views`.
#[derive(Debug)]
pub struct Customer(Record);

impl ActiveRecord for Customer {
    const TABLE_NAME: &'static str = "customers";

    fn from_record(record: Record) -> Self {
        Customer(record)
    }

    fn record(&self) -> &Record {
        &self.0
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }

    fn relations() -> Vec<Relation> {
        vec![
            Relation::has_many("orders", "orders", "customer_id", "id"),
            Relation::has_one("profile", "profiles", "customer_id", "id"),
            Relation::has_many("items", "order_items", "order_id", "id").via("orders"),
        ]
    }

    fn counter_columns() -> &'static [&'static str] {
        &["views"]
    }

    fn validate(&mut self, _attributes: Option<&[&str]>) -> bool {
        self.get("name").is_some_and(|name| !name.is_null())
    }

    fn before_save(&mut self, _insert: bool) -> bool {
        self.get("name") != Some(&Value::from("vetoed"))
    }
}

pub fn customer_catalog(driver: ScriptedDriver) -> ScriptedDriver {
    driver.catalog(
        "customers",
        &[
            ("id", "int", true),
            ("name", "varchar(80)", false),
            ("status", "int", false),
            ("views", "int", false),
        ],
    )
}

pub fn customer_row(id: i64, name: &str, status: i64) -> Row {
    Row::from_pairs([
        ("id", Value::from(id)),
        ("name", Value::from(name)),
        ("status", Value::from(status)),
    ])
}
