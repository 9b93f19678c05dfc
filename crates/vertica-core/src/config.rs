//! Connection configuration.
//!
//! Holds the data-source parameters for establishing a Vertica connection
//! through an ODBC driver manager.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The only component type this adapter can drive.
pub const VERTICA_COMPONENT: &str = "vertica";

/// Vertica connection configuration.
///
/// Deserializable so hosts can keep it next to the rest of their settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Component type; must be `"vertica"`.
    pub component: String,
    /// ODBC data source name, or a full connection string.
    pub dsn: String,
    /// User name for authentication
    pub username: Option<String>,
    /// Password for authentication
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Statements run right after the handle is opened
    /// (e.g. `SET SEARCH_PATH TO app, public`).
    pub init_statements: Vec<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            component: VERTICA_COMPONENT.to_string(),
            dsn: String::new(),
            username: None,
            password: None,
            init_statements: Vec::new(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data source name.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = dsn.into();
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the component type.
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    /// Add a statement to run after the connection opens.
    pub fn init_statement(mut self, sql: impl Into<String>) -> Self {
        self.init_statements.push(sql.into());
        self
    }

    /// Whether `dsn` is already a full ODBC connection string
    /// (`DSN=...;UID=...` or `Driver={...};...`) rather than a bare DSN.
    pub fn is_connection_string(&self) -> bool {
        self.dsn.contains('=')
    }

    /// Check the configuration before a connect attempt.
    pub fn validate(&self) -> Result<()> {
        if !self.component.eq_ignore_ascii_case(VERTICA_COMPONENT) {
            return Err(Error::Configuration(format!(
                "the required component is not specified: expected {VERTICA_COMPONENT:?}, got {:?}",
                self.component
            )));
        }
        if self.dsn.trim().is_empty() {
            return Err(Error::Configuration(
                "a data source name (dsn) is required".to_string(),
            ));
        }
        Ok(())
    }
}
