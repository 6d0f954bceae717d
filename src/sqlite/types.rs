use rusqlite::types::{Type, Value, ValueRef};

use crate::marshal::{NativeCell, NativeData, NativeTypeTag};
use crate::types::{DbValue, ValueKind};

/// `SQLite` storage classes.
///
/// `SQLite` types values, not columns, so every fetched cell carries its own tag.
/// `Dynamic` stands for a result column before any value has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
    Dynamic,
}

impl NativeTypeTag for SqliteType {
    fn value_kind(self) -> ValueKind {
        match self {
            SqliteType::Null => ValueKind::Nil,
            SqliteType::Integer => ValueKind::Integer,
            SqliteType::Real => ValueKind::Float,
            SqliteType::Text | SqliteType::Blob | SqliteType::Dynamic => ValueKind::String,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            SqliteType::Null => "NULL",
            SqliteType::Integer => "INTEGER",
            SqliteType::Real => "REAL",
            SqliteType::Text => "TEXT",
            SqliteType::Blob => "BLOB",
            SqliteType::Dynamic => "DYNAMIC",
        }
    }
}

impl From<Type> for SqliteType {
    fn from(value: Type) -> Self {
        match value {
            Type::Null => SqliteType::Null,
            Type::Integer => SqliteType::Integer,
            Type::Real => SqliteType::Real,
            Type::Text => SqliteType::Text,
            Type::Blob => SqliteType::Blob,
        }
    }
}

/// Convert one fetched value into a native cell tagged with its storage class.
#[must_use]
pub fn cell_from_value_ref(value: ValueRef<'_>) -> NativeCell {
    let tag = SqliteType::from(value.data_type());
    let kind = tag.value_kind();
    match value {
        ValueRef::Null => NativeCell::null(kind),
        ValueRef::Integer(i) => NativeCell::new(kind, NativeData::Integer(i)),
        ValueRef::Real(f) => NativeCell::new(kind, NativeData::Float(f)),
        ValueRef::Text(bytes) => NativeCell::new(
            kind,
            NativeData::Text(String::from_utf8_lossy(bytes).into_owned()),
        ),
        ValueRef::Blob(bytes) => NativeCell::new(kind, NativeData::Blob(bytes.to_vec())),
    }
}

/// Convert a marshalled parameter to the value rusqlite binds.
#[must_use]
pub fn to_sqlite_value(value: &DbValue) -> Value {
    match value {
        DbValue::Nil => Value::Null,
        DbValue::Integer(i) => Value::Integer(*i),
        DbValue::Float(f) => Value::Real(*f),
        DbValue::String(s) => Value::Text(s.clone()),
        DbValue::Boolean(b) => Value::Integer(i64::from(*b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::decode_cell;

    #[test]
    fn storage_class_decides_kind() {
        let cell = cell_from_value_ref(ValueRef::Integer(7));
        assert_eq!(cell.kind, ValueKind::Integer);
        assert_eq!(decode_cell(cell).unwrap(), DbValue::Integer(7));

        let cell = cell_from_value_ref(ValueRef::Null);
        assert!(cell.is_null);
        assert_eq!(decode_cell(cell).unwrap(), DbValue::Nil);

        let cell = cell_from_value_ref(ValueRef::Blob(b"raw"));
        assert_eq!(decode_cell(cell).unwrap(), DbValue::String("raw".into()));
    }

    #[test]
    fn booleans_bind_as_integers() {
        assert_eq!(to_sqlite_value(&DbValue::Boolean(true)), Value::Integer(1));
        assert_eq!(to_sqlite_value(&DbValue::Nil), Value::Null);
    }
}
