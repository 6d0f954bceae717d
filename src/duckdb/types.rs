use duckdb::arrow::datatypes::DataType;
use duckdb::core::LogicalTypeId;
use duckdb::types::{TimeUnit, ValueRef};

use crate::marshal::{NativeCell, NativeData, NativeTypeTag};
use crate::types::{DbValue, ValueKind};

/// `DuckDB` logical types with a dedicated decoding path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckDbType {
    Null,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    HugeInt,
    UHugeInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    Float,
    Double,
    Decimal,
    Varchar,
    Blob,
    Date,
    Time,
    Timestamp,
    Other,
}

impl NativeTypeTag for DuckDbType {
    fn value_kind(self) -> ValueKind {
        match self {
            DuckDbType::Null => ValueKind::Nil,
            DuckDbType::Boolean => ValueKind::Boolean,
            DuckDbType::TinyInt
            | DuckDbType::SmallInt
            | DuckDbType::Integer
            | DuckDbType::BigInt
            | DuckDbType::HugeInt
            | DuckDbType::UHugeInt
            | DuckDbType::UTinyInt
            | DuckDbType::USmallInt
            | DuckDbType::UInteger
            | DuckDbType::UBigInt => ValueKind::Integer,
            DuckDbType::Float | DuckDbType::Double | DuckDbType::Decimal => ValueKind::Float,
            _ => ValueKind::String,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            DuckDbType::Null => "NULL",
            DuckDbType::Boolean => "BOOLEAN",
            DuckDbType::TinyInt => "TINYINT",
            DuckDbType::SmallInt => "SMALLINT",
            DuckDbType::Integer => "INTEGER",
            DuckDbType::BigInt => "BIGINT",
            DuckDbType::HugeInt => "HUGEINT",
            DuckDbType::UHugeInt => "UHUGEINT",
            DuckDbType::UTinyInt => "UTINYINT",
            DuckDbType::USmallInt => "USMALLINT",
            DuckDbType::UInteger => "UINTEGER",
            DuckDbType::UBigInt => "UBIGINT",
            DuckDbType::Float => "FLOAT",
            DuckDbType::Double => "DOUBLE",
            DuckDbType::Decimal => "DECIMAL",
            DuckDbType::Varchar => "VARCHAR",
            DuckDbType::Blob => "BLOB",
            DuckDbType::Date => "DATE",
            DuckDbType::Time => "TIME",
            DuckDbType::Timestamp => "TIMESTAMP",
            DuckDbType::Other => "OTHER",
        }
    }

    fn buffer_size(self) -> Option<usize> {
        match self {
            DuckDbType::Boolean | DuckDbType::TinyInt | DuckDbType::UTinyInt => Some(1),
            DuckDbType::SmallInt | DuckDbType::USmallInt => Some(2),
            DuckDbType::Integer | DuckDbType::UInteger | DuckDbType::Float | DuckDbType::Date => {
                Some(4)
            }
            DuckDbType::BigInt
            | DuckDbType::UBigInt
            | DuckDbType::Double
            | DuckDbType::Time
            | DuckDbType::Timestamp => Some(8),
            DuckDbType::HugeInt | DuckDbType::UHugeInt => Some(16),
            _ => None,
        }
    }
}

impl DuckDbType {
    /// Tag for a result column. The logical type settles what the arrow shape leaves
    /// ambiguous (`HUGEINT`, `UHUGEINT` and `DECIMAL(38, 0)` share one).
    #[must_use]
    pub fn from_column(logical: LogicalTypeId, arrow: &DataType) -> Self {
        match logical {
            LogicalTypeId::Hugeint => DuckDbType::HugeInt,
            LogicalTypeId::UHugeint => DuckDbType::UHugeInt,
            LogicalTypeId::Decimal => DuckDbType::Decimal,
            _ => DuckDbType::from(arrow),
        }
    }
}

impl From<&DataType> for DuckDbType {
    fn from(value: &DataType) -> Self {
        match value {
            DataType::Null => DuckDbType::Null,
            DataType::Boolean => DuckDbType::Boolean,
            DataType::Int8 => DuckDbType::TinyInt,
            DataType::Int16 => DuckDbType::SmallInt,
            DataType::Int32 => DuckDbType::Integer,
            DataType::Int64 => DuckDbType::BigInt,
            DataType::UInt8 => DuckDbType::UTinyInt,
            DataType::UInt16 => DuckDbType::USmallInt,
            DataType::UInt32 => DuckDbType::UInteger,
            DataType::UInt64 => DuckDbType::UBigInt,
            DataType::Float32 => DuckDbType::Float,
            DataType::Float64 => DuckDbType::Double,
            // Without logical metadata, DECIMAL(38, 0) is DuckDB's HUGEINT carrier.
            DataType::Decimal128(38, 0) => DuckDbType::HugeInt,
            DataType::Decimal128(..) => DuckDbType::Decimal,
            DataType::Utf8 | DataType::LargeUtf8 => DuckDbType::Varchar,
            DataType::Binary | DataType::LargeBinary => DuckDbType::Blob,
            DataType::Date32 | DataType::Date64 => DuckDbType::Date,
            DataType::Time32(_) | DataType::Time64(_) => DuckDbType::Time,
            DataType::Timestamp(..) => DuckDbType::Timestamp,
            _ => DuckDbType::Other,
        }
    }
}

// Days from 0001-01-01 to the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn format_date(days: i32) -> String {
    match days {
        i32::MAX => "infinity".to_string(),
        d if d == -i32::MAX => "-infinity".to_string(),
        _ => days
            .checked_add(EPOCH_DAYS_FROM_CE)
            .and_then(chrono::NaiveDate::from_num_days_from_ce_opt)
            .map_or_else(|| format!("DATE({days})"), |d| d.format("%Y-%m-%d").to_string()),
    }
}

fn micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Convert one fetched value into a native cell tagged with its own type.
#[must_use]
pub fn cell_from_value_ref(value: ValueRef<'_>) -> NativeCell {
    let (tag, data) = match value {
        ValueRef::Null => return NativeCell::null(ValueKind::Nil),
        ValueRef::Boolean(b) => (DuckDbType::Boolean, NativeData::Boolean(b)),
        ValueRef::TinyInt(i) => (DuckDbType::TinyInt, NativeData::Integer(i64::from(i))),
        ValueRef::SmallInt(i) => (DuckDbType::SmallInt, NativeData::Integer(i64::from(i))),
        ValueRef::Int(i) => (DuckDbType::Integer, NativeData::Integer(i64::from(i))),
        ValueRef::BigInt(i) => (DuckDbType::BigInt, NativeData::Integer(i)),
        ValueRef::HugeInt(i) => (DuckDbType::HugeInt, NativeData::Wide(i)),
        ValueRef::UHugeInt(u) => match i128::try_from(u) {
            Ok(w) => (DuckDbType::UHugeInt, NativeData::Wide(w)),
            Err(_) => return NativeCell::new(ValueKind::String, NativeData::Text(u.to_string())),
        },
        ValueRef::UTinyInt(i) => (DuckDbType::UTinyInt, NativeData::Integer(i64::from(i))),
        ValueRef::USmallInt(i) => (DuckDbType::USmallInt, NativeData::Integer(i64::from(i))),
        ValueRef::UInt(i) => (DuckDbType::UInteger, NativeData::Integer(i64::from(i))),
        ValueRef::UBigInt(i) => (DuckDbType::UBigInt, NativeData::Unsigned(i)),
        ValueRef::Float(f) => (DuckDbType::Float, NativeData::Float(f64::from(f))),
        ValueRef::Double(f) => (DuckDbType::Double, NativeData::Float(f)),
        ValueRef::Decimal(d) => (DuckDbType::Decimal, NativeData::Text(d.to_string())),
        ValueRef::Text(bytes) => (
            DuckDbType::Varchar,
            NativeData::Text(String::from_utf8_lossy(bytes).into_owned()),
        ),
        ValueRef::Blob(bytes) => (DuckDbType::Blob, NativeData::Blob(bytes.to_vec())),
        ValueRef::Date32(days) => (DuckDbType::Date, NativeData::Text(format_date(days))),
        ValueRef::Time64(unit, value) => {
            let us = micros(unit, value);
            let text = u32::try_from(us / 1_000_000)
                .ok()
                .and_then(|secs| {
                    let nanos = u32::try_from((us % 1_000_000) * 1_000).ok()?;
                    chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                })
                .map_or_else(|| format!("TIME({us})"), |t| t.format("%H:%M:%S%.f").to_string());
            (DuckDbType::Time, NativeData::Text(text))
        }
        ValueRef::Timestamp(unit, value) => {
            let us = micros(unit, value);
            let text = chrono::DateTime::from_timestamp_micros(us).map_or_else(
                || format!("TIMESTAMP({us})"),
                |dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            );
            (DuckDbType::Timestamp, NativeData::Text(text))
        }
        other => (
            DuckDbType::Other,
            NativeData::Text(format!("{:?}", duckdb::types::Value::from(other))),
        ),
    };
    NativeCell::new(tag.value_kind(), data)
}

/// Convert a marshalled parameter to the value duckdb binds.
#[must_use]
pub fn to_duckdb_value(value: &DbValue) -> duckdb::types::Value {
    use duckdb::types::Value;
    match value {
        DbValue::Nil => Value::Null,
        DbValue::Integer(i) => Value::BigInt(*i),
        DbValue::Float(f) => Value::Double(*f),
        DbValue::String(s) => Value::Text(s.clone()),
        DbValue::Boolean(b) => Value::Boolean(*b),
    }
}
