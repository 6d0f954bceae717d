//! Conversion between host values, marshalled [`DbValue`]s and raw native cells.
//!
//! Adapters own the native side of the mapping: each one describes its type tags with a
//! [`NativeTypeTag`] implementation (an enum lookup, never a trait hierarchy) and hands
//! fetched data over as [`NativeCell`]s. This module owns the host side and the rules
//! that are the same for every backend.

use crate::error::SqlDbdError;
use crate::types::{DbValue, ScriptValue, ValueKind};

/// A backend's type tag, as reported in column metadata or per value.
pub trait NativeTypeTag: Copy {
    /// Script-value kind this tag decodes to.
    fn value_kind(self) -> ValueKind;

    /// Name of the tag as the backend spells it.
    fn type_name(self) -> &'static str;

    /// Fixed client-side buffer size for this tag, when the backend preallocates one.
    fn buffer_size(self) -> Option<usize> {
        None
    }
}

/// Raw data pulled out of a native result buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeData {
    /// Nothing was read; pairs with a set NULL indicator.
    Empty,
    Integer(i64),
    /// Unsigned integers wider than what `i64` can always hold.
    Unsigned(u64),
    /// Integers wider than 64 bits (`HUGEINT` and friends).
    Wide(i128),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

/// One column value of a fetched row, before decoding.
///
/// The NULL indicator is kept apart from the data because backends signal NULL
/// out-of-band (length sentinels, validity bitmaps, indicator out-parameters) while the
/// data buffer may still hold stale bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCell {
    pub is_null: bool,
    pub kind: ValueKind,
    pub data: NativeData,
}

impl NativeCell {
    #[must_use]
    pub fn null(kind: ValueKind) -> Self {
        Self {
            is_null: true,
            kind,
            data: NativeData::Empty,
        }
    }

    #[must_use]
    pub fn new(kind: ValueKind, data: NativeData) -> Self {
        Self {
            is_null: false,
            kind,
            data,
        }
    }
}

/// How host values are encoded for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindPolicy {
    /// The backend binds 64-bit integers losslessly.
    pub integer_binding: bool,
}

impl Default for BindPolicy {
    fn default() -> Self {
        Self {
            integer_binding: true,
        }
    }
}

/// Encode one host value for binding.
///
/// `position` is 1-based and only used for error reporting.
///
/// # Errors
/// Returns `SqlDbdError::BindingTypeUnsupported` for host values outside the closed kind
/// set (tables, functions, userdata, threads).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn encode_param(
    position: usize,
    value: &ScriptValue,
    policy: BindPolicy,
) -> Result<DbValue, SqlDbdError> {
    match value {
        ScriptValue::Nil => Ok(DbValue::Nil),
        ScriptValue::Boolean(b) => Ok(DbValue::Boolean(*b)),
        ScriptValue::Integer(i) if policy.integer_binding => Ok(DbValue::Integer(*i)),
        ScriptValue::Integer(i) => Ok(DbValue::Float(*i as f64)),
        ScriptValue::Number(n) => {
            if policy.integer_binding && is_lossless_integer(*n) {
                Ok(DbValue::Integer(*n as i64))
            } else {
                Ok(DbValue::Float(*n))
            }
        }
        ScriptValue::String(s) => Ok(DbValue::String(s.clone())),
        other => Err(SqlDbdError::BindingTypeUnsupported {
            position,
            type_name: other.type_name(),
        }),
    }
}

/// Encode a full argument list, stopping at the first unsupported value.
///
/// # Errors
/// Returns the first `SqlDbdError::BindingTypeUnsupported` encountered.
pub fn encode_params(
    params: &[ScriptValue],
    policy: BindPolicy,
) -> Result<Vec<DbValue>, SqlDbdError> {
    params
        .iter()
        .enumerate()
        .map(|(idx, value)| encode_param(idx + 1, value, policy))
        .collect()
}

// 2^63 is exactly representable; anything at or above it does not fit.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn is_lossless_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n >= -I64_UPPER && n < I64_UPPER
}

/// Decode one native cell into a script value.
///
/// The NULL indicator wins over everything else: a NULL cell is `Nil` whatever its
/// declared kind or leftover data.
///
/// # Errors
/// Returns `SqlDbdError::UnknownResultKind` when the data cannot be represented in the
/// requested kind (for example a blob decoded as an integer).
pub fn decode_cell(cell: NativeCell) -> Result<DbValue, SqlDbdError> {
    if cell.is_null {
        return Ok(DbValue::Nil);
    }

    let NativeCell { kind, data, .. } = cell;
    match kind {
        ValueKind::Nil => Ok(DbValue::Nil),
        ValueKind::Integer => decode_integer(data),
        ValueKind::Float => decode_float(data),
        ValueKind::Boolean => decode_boolean(data),
        ValueKind::String => Ok(DbValue::String(data_to_text(data))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decode_integer(data: NativeData) -> Result<DbValue, SqlDbdError> {
    match data {
        NativeData::Integer(i) => Ok(DbValue::Integer(i)),
        // Out-of-range widths keep their exact digits instead of wrapping.
        NativeData::Unsigned(u) => Ok(i64::try_from(u)
            .map_or_else(|_| DbValue::String(u.to_string()), DbValue::Integer)),
        NativeData::Wide(w) => Ok(i64::try_from(w)
            .map_or_else(|_| DbValue::String(w.to_string()), DbValue::Integer)),
        NativeData::Boolean(b) => Ok(DbValue::Integer(i64::from(b))),
        NativeData::Float(f) if is_lossless_integer(f) => Ok(DbValue::Integer(f as i64)),
        NativeData::Float(f) => Ok(DbValue::Float(f)),
        NativeData::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(DbValue::Integer)
            .map_err(|_| SqlDbdError::UnknownResultKind(format!("`{s}` is not an integer"))),
        NativeData::Empty => Ok(DbValue::Nil),
        NativeData::Blob(_) => Err(SqlDbdError::UnknownResultKind(
            "blob data in an integer column".into(),
        )),
    }
}

#[allow(clippy::cast_precision_loss)]
fn decode_float(data: NativeData) -> Result<DbValue, SqlDbdError> {
    match data {
        NativeData::Float(f) => Ok(DbValue::Float(f)),
        NativeData::Integer(i) => Ok(DbValue::Float(i as f64)),
        NativeData::Unsigned(u) => Ok(DbValue::Float(u as f64)),
        NativeData::Wide(w) => Ok(DbValue::Float(w as f64)),
        NativeData::Boolean(b) => Ok(DbValue::Float(if b { 1.0 } else { 0.0 })),
        NativeData::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(DbValue::Float)
            .map_err(|_| SqlDbdError::UnknownResultKind(format!("`{s}` is not a number"))),
        NativeData::Empty => Ok(DbValue::Nil),
        NativeData::Blob(_) => Err(SqlDbdError::UnknownResultKind(
            "blob data in a float column".into(),
        )),
    }
}

fn decode_boolean(data: NativeData) -> Result<DbValue, SqlDbdError> {
    match data {
        NativeData::Boolean(b) => Ok(DbValue::Boolean(b)),
        NativeData::Integer(i) => Ok(DbValue::Boolean(i != 0)),
        NativeData::Unsigned(u) => Ok(DbValue::Boolean(u != 0)),
        NativeData::Wide(w) => Ok(DbValue::Boolean(w != 0)),
        NativeData::Float(f) => Ok(DbValue::Boolean(f != 0.0)),
        NativeData::Text(s) => match s.trim() {
            "t" | "true" | "TRUE" | "1" => Ok(DbValue::Boolean(true)),
            "f" | "false" | "FALSE" | "0" => Ok(DbValue::Boolean(false)),
            other => Err(SqlDbdError::UnknownResultKind(format!(
                "`{other}` is not a boolean"
            ))),
        },
        NativeData::Empty => Ok(DbValue::Nil),
        NativeData::Blob(_) => Err(SqlDbdError::UnknownResultKind(
            "blob data in a boolean column".into(),
        )),
    }
}

fn data_to_text(data: NativeData) -> String {
    match data {
        NativeData::Text(s) => s,
        NativeData::Blob(bytes) => String::from_utf8(bytes)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()),
        NativeData::Integer(i) => i.to_string(),
        NativeData::Unsigned(u) => u.to_string(),
        NativeData::Wide(w) => w.to_string(),
        NativeData::Float(f) => f.to_string(),
        NativeData::Boolean(b) => b.to_string(),
        NativeData::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn null_indicator_overrides_declared_kind() {
        for kind in [
            ValueKind::Integer,
            ValueKind::Float,
            ValueKind::String,
            ValueKind::Boolean,
        ] {
            let cell = NativeCell {
                is_null: true,
                kind,
                data: NativeData::Integer(42),
            };
            assert_eq!(decode_cell(cell).unwrap(), DbValue::Nil);
        }
    }

    #[test]
    fn text_protocol_values_follow_the_kind() {
        let int = NativeCell::new(ValueKind::Integer, NativeData::Text("17".into()));
        assert_eq!(decode_cell(int).unwrap(), DbValue::Integer(17));

        let float = NativeCell::new(ValueKind::Float, NativeData::Text("2.5".into()));
        assert_eq!(decode_cell(float).unwrap(), DbValue::Float(2.5));

        let flag = NativeCell::new(ValueKind::Boolean, NativeData::Text("t".into()));
        assert_eq!(decode_cell(flag).unwrap(), DbValue::Boolean(true));
    }

    #[test]
    fn oversized_unsigned_keeps_digits() {
        let cell = NativeCell::new(ValueKind::Integer, NativeData::Unsigned(u64::MAX));
        assert_eq!(
            decode_cell(cell).unwrap(),
            DbValue::String(u64::MAX.to_string())
        );

        let cell = NativeCell::new(ValueKind::Integer, NativeData::Unsigned(7));
        assert_eq!(decode_cell(cell).unwrap(), DbValue::Integer(7));
    }

    #[test]
    fn blob_in_numeric_column_is_rejected() {
        let cell = NativeCell::new(ValueKind::Integer, NativeData::Blob(vec![1, 2]));
        let err = decode_cell(cell).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownResultKind);
    }

    #[test]
    fn blob_as_string_is_lossy_utf8() {
        let cell = NativeCell::new(ValueKind::String, NativeData::Blob(b"ab\xffc".to_vec()));
        assert_eq!(
            decode_cell(cell).unwrap(),
            DbValue::String("ab\u{fffd}c".into())
        );
    }

    #[test]
    fn ambiguous_numbers_prefer_integers() {
        let policy = BindPolicy::default();
        assert_eq!(
            encode_param(1, &ScriptValue::Number(3.0), policy).unwrap(),
            DbValue::Integer(3)
        );
        assert_eq!(
            encode_param(1, &ScriptValue::Number(3.5), policy).unwrap(),
            DbValue::Float(3.5)
        );
        assert_eq!(
            encode_param(1, &ScriptValue::Number(1e300), policy).unwrap(),
            DbValue::Float(1e300)
        );

        let no_ints = BindPolicy {
            integer_binding: false,
        };
        assert_eq!(
            encode_param(1, &ScriptValue::Integer(3), no_ints).unwrap(),
            DbValue::Float(3.0)
        );
    }

    #[test]
    fn encoding_stops_at_first_unsupported_value() {
        let params = vec![
            ScriptValue::Integer(1),
            ScriptValue::Function,
            ScriptValue::Table,
        ];
        let err = encode_params(&params, BindPolicy::default()).unwrap_err();
        match err {
            SqlDbdError::BindingTypeUnsupported {
                position,
                type_name,
            } => {
                assert_eq!(position, 2);
                assert_eq!(type_name, "function");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
