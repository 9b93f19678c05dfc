//! Mapping of fetched column text onto [`Value`]s.
//!
//! Every column is fetched as text and converted by its reported SQL type.

use vertica_core::Value;

/// Value family of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Boolean,
    Float,
    Decimal,
    Text,
}

impl ColumnKind {
    /// Convert the fetched text of one cell.
    ///
    /// Text that does not parse as the column's type is kept as text.
    pub fn parse(self, raw: &[u8]) -> Value {
        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim();
        match self {
            ColumnKind::Integer => trimmed
                .parse::<i64>()
                .map_or_else(|_| Value::Text(text.to_string()), Value::BigInt),
            ColumnKind::Boolean => match trimmed {
                "1" | "t" | "true" | "TRUE" => Value::Bool(true),
                "0" | "f" | "false" | "FALSE" => Value::Bool(false),
                _ => Value::Text(text.to_string()),
            },
            ColumnKind::Float => trimmed
                .parse::<f64>()
                .map_or_else(|_| Value::Text(text.to_string()), Value::Double),
            ColumnKind::Decimal => Value::Decimal(trimmed.to_string()),
            ColumnKind::Text => Value::Text(text.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_kind() {
        assert_eq!(ColumnKind::Integer.parse(b"42"), Value::BigInt(42));
        assert_eq!(ColumnKind::Integer.parse(b"x"), Value::Text("x".into()));
        assert_eq!(ColumnKind::Boolean.parse(b"t"), Value::Bool(true));
        assert_eq!(ColumnKind::Boolean.parse(b"0"), Value::Bool(false));
        assert_eq!(ColumnKind::Float.parse(b"1.5"), Value::Double(1.5));
        assert_eq!(ColumnKind::Decimal.parse(b"10.250"), Value::Decimal("10.250".into()));
        assert_eq!(ColumnKind::Text.parse(b" padded "), Value::Text(" padded ".into()));
    }
}
