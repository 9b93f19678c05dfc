//! ODBC connection-string options.
//!
//! Turns a [`ConnectionConfig`] into the `KEY=value;` string handed to the
//! ODBC driver manager. A bare data source name becomes `DSN=<name>`; a
//! `dsn` that already looks like a connection string is used as the base.

use std::fmt;

use vertica_core::ConnectionConfig;

/// Connection-string builder.
#[derive(Clone, Default)]
pub struct OdbcOptions {
    base: String,
    username: Option<String>,
    password: Option<String>,
    attributes: Vec<(String, String)>,
}

impl OdbcOptions {
    /// Options for a bare data source name.
    pub fn dsn(dsn: impl AsRef<str>) -> Self {
        Self {
            base: format!("DSN={}", escape(dsn.as_ref())),
            ..Self::default()
        }
    }

    /// Options from a full connection string, used verbatim as the base.
    pub fn connection_string(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    /// Options from a connection configuration.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut options = if config.is_connection_string() {
            Self::connection_string(config.dsn.trim().trim_end_matches(';'))
        } else {
            Self::dsn(config.dsn.trim())
        };
        options.username.clone_from(&config.username);
        options.password.clone_from(&config.password);
        options
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a driver attribute, e.g. `ConnectionLoadBalance=1`.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// The complete connection string.
    ///
    /// `UID`/`PWD` are only appended when the base does not set them already.
    pub fn build(&self) -> String {
        self.render(false)
    }

    /// The connection string with the password masked, for logs.
    pub fn redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.base.is_empty() {
            parts.push(if redact {
                redact_base(&self.base)
            } else {
                self.base.clone()
            });
        }
        if let Some(user) = &self.username {
            if !has_key(&self.base, "UID") {
                parts.push(format!("UID={}", escape(user)));
            }
        }
        if let Some(password) = &self.password {
            if !has_key(&self.base, "PWD") {
                let value = if redact { "***".to_string() } else { escape(password) };
                parts.push(format!("PWD={value}"));
            }
        }
        for (key, value) in &self.attributes {
            parts.push(format!("{key}={}", escape(value)));
        }
        let mut out = parts.join(";");
        if !out.is_empty() {
            out.push(';');
        }
        out
    }
}

impl fmt::Debug for OdbcOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OdbcOptions").field(&self.redacted()).finish()
    }
}

/// Brace a value that contains characters with meaning in a connection string.
fn escape(value: &str) -> String {
    if value.contains([';', '{', '}', '=']) || value.trim() != value {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

fn has_key(base: &str, key: &str) -> bool {
    base.split(';').any(|pair| {
        pair.split_once('=')
            .is_some_and(|(k, _)| k.trim().eq_ignore_ascii_case(key))
    })
}

fn redact_base(base: &str) -> String {
    base.split(';')
        .map(|pair| match pair.split_once('=') {
            Some((k, _)) if k.trim().eq_ignore_ascii_case("PWD") => format!("{k}=***"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_dsn_with_credentials() {
        let config = ConnectionConfig::new()
            .dsn("VerticaDSN")
            .username("dbadmin")
            .password("secret");
        assert_eq!(
            OdbcOptions::from_config(&config).build(),
            "DSN=VerticaDSN;UID=dbadmin;PWD=secret;"
        );
    }

    #[test]
    fn test_connection_string_is_kept() {
        let config = ConnectionConfig::new()
            .dsn("Driver=Vertica;Servername=db1;Database=vdb;UID=app;")
            .username("ignored")
            .password("pw");
        assert_eq!(
            OdbcOptions::from_config(&config).build(),
            "Driver=Vertica;Servername=db1;Database=vdb;UID=app;PWD=pw;"
        );
    }

    #[test]
    fn test_values_with_separators_are_braced() {
        let options = OdbcOptions::dsn("vdb").password("a;b}c");
        assert_eq!(options.build(), "DSN=vdb;PWD={a;b}}c};");
    }

    #[test]
    fn test_attributes() {
        let options = OdbcOptions::dsn("vdb").attribute("ConnectionLoadBalance", "1");
        assert_eq!(options.build(), "DSN=vdb;ConnectionLoadBalance=1;");
    }

    #[test]
    fn test_redacted_hides_password() {
        let options = OdbcOptions::dsn("vdb").username("u").password("secret");
        assert_eq!(options.redacted(), "DSN=vdb;UID=u;PWD=***;");
        assert!(!format!("{options:?}").contains("secret"));

        let inline = OdbcOptions::connection_string("DSN=vdb;PWD=secret");
        assert_eq!(inline.redacted(), "DSN=vdb;PWD=***;");
    }
}
