use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The closed set of value kinds visible to the scripting host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Nil,
    Integer,
    Float,
    String,
    Boolean,
}

impl ValueKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marshalled value: either a decoded column value or an encoded parameter.
///
/// Every backend reads and writes this same enum, so code above the adapters never
/// branches on driver types:
/// ```rust
/// use sql_dbd::prelude::*;
///
/// let row = vec![DbValue::Integer(1), DbValue::String("alice".into()), DbValue::Nil];
/// assert_eq!(row[0].kind(), ValueKind::Integer);
/// assert!(row[2].is_nil());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    /// SQL NULL
    Nil,
    /// Integer value (64-bit)
    Integer(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text value; binary columns are surfaced here as well
    String(String),
    /// Boolean value
    Boolean(bool),
}

impl DbValue {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            DbValue::Nil => ValueKind::Nil,
            DbValue::Integer(_) => ValueKind::Integer,
            DbValue::Float(_) => ValueKind::Float,
            DbValue::String(_) => ValueKind::String,
            DbValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let DbValue::Integer(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DbValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            DbValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let DbValue::String(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DbValue::Boolean(value) => Some(*value),
            DbValue::Integer(1) => Some(true),
            DbValue::Integer(0) => Some(false),
            _ => None,
        }
    }
}

/// A value as handed over by the scripting host.
///
/// The host's type system is wider than what can be bound: tables, functions, userdata
/// and coroutines exist on the host side but have no SQL representation. `Number` is the
/// host's untyped number (a double that may or may not hold an integral value), while
/// `Integer` is an explicitly integral host number.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Table,
    Function,
    Userdata,
    Thread,
}

impl ScriptValue {
    /// The host-visible type name, used in binding error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Boolean(_) => "boolean",
            ScriptValue::Integer(_) | ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Table => "table",
            ScriptValue::Function => "function",
            ScriptValue::Userdata => "userdata",
            ScriptValue::Thread => "thread",
        }
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        ScriptValue::Integer(value)
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        ScriptValue::Integer(i64::from(value))
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Boolean(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

impl<T: Into<ScriptValue>> From<Option<T>> for ScriptValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ScriptValue::Nil, Into::into)
    }
}

/// The database engines this crate ships adapters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    Postgres,
    /// `DuckDB` database
    #[cfg(feature = "duckdb")]
    Duckdb,
}

impl DatabaseType {
    /// Registration name of the driver, as used in `{"driver": "..."}` option documents.
    #[must_use]
    pub fn driver_name(self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => "sqlite",
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => "postgres",
            #[cfg(feature = "duckdb")]
            DatabaseType::Duckdb => "duckdb",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_type_names() {
        assert_eq!(ScriptValue::Integer(1).type_name(), "number");
        assert_eq!(ScriptValue::Number(1.5).type_name(), "number");
        assert_eq!(ScriptValue::Table.type_name(), "table");
        assert_eq!(ScriptValue::from(None::<i64>), ScriptValue::Nil);
    }

    #[test]
    fn bool_view_accepts_integer_flags() {
        assert_eq!(DbValue::Integer(1).as_bool(), Some(true));
        assert_eq!(DbValue::Integer(0).as_bool(), Some(false));
        assert_eq!(DbValue::Integer(2).as_bool(), None);
        assert_eq!(DbValue::Boolean(false).as_bool(), Some(false));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn database_type_parses_from_cli_value() {
        let parsed = DatabaseType::from_str("sqlite", true).expect("known driver");
        assert_eq!(parsed, DatabaseType::Sqlite);
        assert_eq!(parsed.to_string(), "sqlite");
    }
}
