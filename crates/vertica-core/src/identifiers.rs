//! Identifier validation.
//!
//! Table and column names are spliced into SQL text, so every name that
//! reaches a builder goes through [`validate_identifier`] first. Vertica folds
//! unquoted identifiers to lower case; names are emitted unquoted, as the
//! catalog stores them.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]{0,127}(\.[A-Za-z_][A-Za-z0-9_$]{0,127})?$")
            .unwrap_or_else(|e| unreachable!("identifier pattern is valid: {e}"))
    })
}

/// Whether `name` is a plain or schema-qualified Vertica identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_re().is_match(name)
}

/// Validate an identifier and return it unchanged.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Validate a select-list entry: `*`, `table.*`, an identifier, or an
/// identifier with an `AS` alias.
pub fn validate_field(field: &str) -> Result<&str> {
    let trimmed = field.trim();
    if trimmed == "*" {
        return Ok(field);
    }
    if let Some(table) = trimmed.strip_suffix(".*") {
        validate_identifier(table)?;
        return Ok(field);
    }
    let lower = trimmed.to_ascii_lowercase();
    if let Some(pos) = lower.find(" as ") {
        validate_identifier(trimmed[..pos].trim())?;
        validate_identifier(trimmed[pos + 4..].trim())?;
        return Ok(field);
    }
    validate_identifier(trimmed)?;
    Ok(field)
}
