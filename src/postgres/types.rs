use std::error::Error;
use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use tokio_util::bytes::{BufMut, BytesMut};

use crate::error::SqlDbdError;
use crate::marshal::{NativeCell, NativeData, NativeTypeTag};
use crate::types::{DbValue, ValueKind};

type BoxError = Box<dyn Error + Sync + Send>;

/// `PostgreSQL` column types with a dedicated decoding path.
///
/// Results arrive in the binary wire format, so a type only decodes when it has a codec
/// here. Columns tagged `Other` fail to fetch with `UnknownResultKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgType {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Numeric,
    Text,
    /// The single-byte `"char"` type.
    Char,
    /// User-defined enums; their binary form is the label text.
    Enum,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    Jsonb,
    Bytea,
    Uuid,
    Interval,
    Inet,
    Other,
}

impl PgType {
    #[must_use]
    pub fn from_type(ty: &Type) -> Self {
        match *ty {
            Type::BOOL => PgType::Bool,
            Type::INT2 => PgType::Int2,
            Type::INT4 => PgType::Int4,
            Type::INT8 => PgType::Int8,
            Type::OID => PgType::Oid,
            Type::FLOAT4 => PgType::Float4,
            Type::FLOAT8 => PgType::Float8,
            Type::NUMERIC => PgType::Numeric,
            Type::CHAR => PgType::Char,
            Type::DATE => PgType::Date,
            Type::TIME => PgType::Time,
            Type::TIMESTAMP => PgType::Timestamp,
            Type::TIMESTAMPTZ => PgType::TimestampTz,
            Type::JSON => PgType::Json,
            Type::JSONB => PgType::Jsonb,
            Type::BYTEA => PgType::Bytea,
            Type::UUID => PgType::Uuid,
            Type::INTERVAL => PgType::Interval,
            Type::INET | Type::CIDR => PgType::Inet,
            _ if is_text_type(ty) => PgType::Text,
            _ if matches!(ty.kind(), Kind::Enum(_)) => PgType::Enum,
            _ => PgType::Other,
        }
    }
}

impl NativeTypeTag for PgType {
    fn value_kind(self) -> ValueKind {
        match self {
            PgType::Bool => ValueKind::Boolean,
            PgType::Int2 | PgType::Int4 | PgType::Int8 | PgType::Oid => ValueKind::Integer,
            PgType::Float4 | PgType::Float8 | PgType::Numeric => ValueKind::Float,
            _ => ValueKind::String,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            PgType::Bool => "bool",
            PgType::Int2 => "int2",
            PgType::Int4 => "int4",
            PgType::Int8 => "int8",
            PgType::Oid => "oid",
            PgType::Float4 => "float4",
            PgType::Float8 => "float8",
            PgType::Numeric => "numeric",
            PgType::Text => "text",
            PgType::Char => "char",
            PgType::Enum => "enum",
            PgType::Date => "date",
            PgType::Time => "time",
            PgType::Timestamp => "timestamp",
            PgType::TimestampTz => "timestamptz",
            PgType::Json => "json",
            PgType::Jsonb => "jsonb",
            PgType::Bytea => "bytea",
            PgType::Uuid => "uuid",
            PgType::Interval => "interval",
            PgType::Inet => "inet",
            PgType::Other => "other",
        }
    }

    fn buffer_size(self) -> Option<usize> {
        match self {
            PgType::Bool | PgType::Char => Some(1),
            PgType::Int2 => Some(2),
            PgType::Int4 | PgType::Oid | PgType::Float4 | PgType::Date => Some(4),
            PgType::Int8
            | PgType::Float8
            | PgType::Time
            | PgType::Timestamp
            | PgType::TimestampTz => Some(8),
            PgType::Uuid | PgType::Interval => Some(16),
            _ => None,
        }
    }
}

fn is_text_type(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || ty.name() == "citext"
}

/// Raw wire bytes of any column type.
struct RawBytes(Vec<u8>);

impl<'a> FromSql<'a> for RawBytes {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(RawBytes(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Decode column `idx` of `row` into a native cell.
///
/// # Errors
/// * `SqlDbdError::FetchFailed` when the wire value cannot be read as its declared type
/// * `SqlDbdError::UnknownResultKind` for a column type without a binary decoder
pub fn cell_from_row(row: &Row, idx: usize, tag: PgType) -> Result<NativeCell, SqlDbdError> {
    let kind = tag.value_kind();
    let fetch_err = |e: tokio_postgres::Error| SqlDbdError::FetchFailed(e.to_string());
    let decode_err = |e: BoxError| SqlDbdError::FetchFailed(e.to_string());
    let raw = || row.try_get::<_, Option<RawBytes>>(idx).map_err(fetch_err);

    let data = match tag {
        PgType::Bool => row.try_get::<_, Option<bool>>(idx).map_err(fetch_err)?.map(NativeData::Boolean),
        PgType::Int2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(fetch_err)?
            .map(|v| NativeData::Integer(i64::from(v))),
        PgType::Int4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(fetch_err)?
            .map(|v| NativeData::Integer(i64::from(v))),
        PgType::Int8 => row.try_get::<_, Option<i64>>(idx).map_err(fetch_err)?.map(NativeData::Integer),
        PgType::Oid => row
            .try_get::<_, Option<u32>>(idx)
            .map_err(fetch_err)?
            .map(|v| NativeData::Integer(i64::from(v))),
        PgType::Float4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(fetch_err)?
            .map(|v| NativeData::Float(f64::from(v))),
        PgType::Float8 => row.try_get::<_, Option<f64>>(idx).map_err(fetch_err)?.map(NativeData::Float),
        PgType::Numeric => match raw()? {
            Some(raw) => Some(NativeData::Text(decode_numeric(&raw.0).map_err(decode_err)?)),
            None => None,
        },
        PgType::Text => row.try_get::<_, Option<String>>(idx).map_err(fetch_err)?.map(NativeData::Text),
        PgType::Char => row
            .try_get::<_, Option<i8>>(idx)
            .map_err(fetch_err)?
            .map(|v| NativeData::Text(char::from(u8::from_ne_bytes(v.to_ne_bytes())).to_string())),
        PgType::Enum => match raw()? {
            Some(raw) => Some(NativeData::Text(
                String::from_utf8(raw.0).map_err(|e| SqlDbdError::FetchFailed(e.to_string()))?,
            )),
            None => None,
        },
        PgType::Date => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map_err(fetch_err)?
            .map(|d| NativeData::Text(d.format("%Y-%m-%d").to_string())),
        PgType::Time => row
            .try_get::<_, Option<NaiveTime>>(idx)
            .map_err(fetch_err)?
            .map(|t| NativeData::Text(t.format("%H:%M:%S%.f").to_string())),
        PgType::Timestamp => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(fetch_err)?
            .map(|ts| NativeData::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        PgType::TimestampTz => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(fetch_err)?
            .map(|ts| NativeData::Text(ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())),
        PgType::Json | PgType::Jsonb => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(fetch_err)?
            .map(|v| NativeData::Text(v.to_string())),
        PgType::Bytea => row.try_get::<_, Option<Vec<u8>>>(idx).map_err(fetch_err)?.map(NativeData::Blob),
        PgType::Uuid => match raw()? {
            Some(raw) => Some(NativeData::Text(format_uuid(&raw.0).map_err(decode_err)?)),
            None => None,
        },
        PgType::Interval => match raw()? {
            Some(raw) => Some(NativeData::Text(format_interval(&raw.0).map_err(decode_err)?)),
            None => None,
        },
        PgType::Inet => match raw()? {
            Some(raw) => Some(NativeData::Text(format_inet(&raw.0).map_err(decode_err)?)),
            None => None,
        },
        // NULL needs no decoder; anything else would be raw binary.
        PgType::Other => match raw()? {
            Some(_) => {
                let type_name = row.columns().get(idx).map_or("unknown", |c| c.type_().name());
                return Err(SqlDbdError::UnknownResultKind(format!(
                    "no decoder for column {idx} of type `{type_name}`"
                )));
            }
            None => None,
        },
    };

    Ok(data.map_or_else(|| NativeCell::null(kind), |data| NativeCell::new(kind, data)))
}

fn be_i64(raw: &[u8], at: usize) -> Result<i64, BoxError> {
    raw.get(at..at + 8)
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
        .map(i64::from_be_bytes)
        .ok_or_else(|| "truncated value".into())
}

fn be_i32(raw: &[u8], at: usize) -> Result<i32, BoxError> {
    raw.get(at..at + 4)
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
        .map(i32::from_be_bytes)
        .ok_or_else(|| "truncated value".into())
}

/// Render a binary `uuid` in its hyphenated lower-case form.
///
/// # Errors
/// Returns an error unless `raw` is exactly 16 bytes.
pub fn format_uuid(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 16 {
        return Err(format!("uuid value has {} bytes, expected 16", raw.len()).into());
    }
    let mut out = String::with_capacity(36);
    for (i, byte) in raw.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{byte:02x}");
    }
    Ok(out)
}

/// Parse a uuid written as 32 hex digits, with or without hyphens and braces.
///
/// # Errors
/// Returns an error when `text` is not a uuid.
pub fn parse_uuid(text: &str) -> Result<[u8; 16], BoxError> {
    let hex = text
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .bytes()
        .filter(|b| *b != b'-')
        .collect::<Vec<u8>>();
    if hex.len() != 32 {
        return Err(format!("`{text}` is not a uuid").into());
    }
    let mut out = [0u8; 16];
    for (slot, pair) in out.iter_mut().zip(hex.chunks(2)) {
        *slot = u8::from_str_radix(std::str::from_utf8(pair)?, 16)?;
    }
    Ok(out)
}

/// Render a binary `interval` the way the server's default output style does,
/// e.g. `1 year 2 mons 3 days 04:05:06.5`.
///
/// # Errors
/// Returns an error for truncated input.
pub fn format_interval(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 16 {
        return Err(format!("interval value has {} bytes, expected 16", raw.len()).into());
    }
    let micros = be_i64(raw, 0)?;
    let days = be_i32(raw, 8)?;
    let months = be_i32(raw, 12)?;

    let mut parts = Vec::new();
    for (n, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if n != 0 {
            let plural = if n == 1 { "" } else { "s" };
            parts.push(format!("{n} {unit}{plural}"));
        }
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 {
            "-"
        } else if months < 0 || days < 0 {
            "+"
        } else {
            ""
        };
        let abs = micros.unsigned_abs();
        let secs = abs / 1_000_000;
        let frac = abs % 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if frac != 0 {
            let digits = format!("{frac:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }
    Ok(parts.join(" "))
}

// Address family codes used by the inet/cidr wire format.
const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

/// Render a binary `inet` or `cidr` value; the prefix length is omitted for host
/// addresses.
///
/// # Errors
/// Returns an error for truncated input or an unknown address family.
pub fn format_inet(raw: &[u8]) -> Result<String, BoxError> {
    let [family, bits, is_cidr, len, addr @ ..] = raw else {
        return Err("truncated inet value".into());
    };
    if usize::from(*len) != addr.len() {
        return Err("inet address length mismatch".into());
    }
    let (text, max_bits) = match *family {
        PGSQL_AF_INET => (Ipv4Addr::from(<[u8; 4]>::try_from(addr)?).to_string(), 32),
        PGSQL_AF_INET6 => (Ipv6Addr::from(<[u8; 16]>::try_from(addr)?).to_string(), 128),
        other => return Err(format!("unknown inet address family {other}").into()),
    };
    if *is_cidr == 0 && *bits == max_bits {
        Ok(text)
    } else {
        Ok(format!("{text}/{bits}"))
    }
}

/// Write `addr[/bits]` in the binary `inet`/`cidr` wire format.
///
/// # Errors
/// Returns an error when `text` is not an address or the prefix is too long.
pub fn encode_inet(text: &str, is_cidr: bool, out: &mut BytesMut) -> Result<(), BoxError> {
    let text = text.trim();
    let (addr, bits) = match text.split_once('/') {
        Some((addr, bits)) => (addr, Some(bits.parse::<u8>()?)),
        None => (text, None),
    };
    let (family, max_bits, octets) = match addr.parse::<IpAddr>()? {
        IpAddr::V4(v4) => (PGSQL_AF_INET, 32u8, v4.octets().to_vec()),
        IpAddr::V6(v6) => (PGSQL_AF_INET6, 128u8, v6.octets().to_vec()),
    };
    let bits = bits.unwrap_or(max_bits);
    if bits > max_bits {
        return Err(format!("prefix length {bits} is too long for `{addr}`").into());
    }
    out.put_u8(family);
    out.put_u8(bits);
    out.put_u8(u8::from(is_cidr));
    out.put_u8(u8::try_from(octets.len())?);
    out.put_slice(&octets);
    Ok(())
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render a binary `numeric` value in its canonical decimal text form.
///
/// # Errors
/// Returns an error for truncated or malformed input.
pub fn decode_numeric(raw: &[u8]) -> Result<String, BoxError> {
    let word = |at: usize| -> Result<u16, BoxError> {
        raw.get(at..at + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated numeric value".into())
    };
    let ndigits = usize::from(word(0)?);
    #[allow(clippy::cast_possible_wrap)]
    let weight = i32::from(word(2)? as i16);
    let sign = word(4)?;
    let dscale = usize::from(word(6)?);
    let digits = (0..ndigits)
        .map(|i| word(8 + i * 2))
        .collect::<Result<Vec<u16>, _>>()?;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign {other:#06x}").into()),
    }

    let digit_at = |idx: i32| -> u16 {
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for idx in 0..=weight {
            if idx == 0 {
                let _ = write!(out, "{}", digit_at(idx));
            } else {
                let _ = write!(out, "{:04}", digit_at(idx));
            }
        }
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut idx = weight + 1;
        while frac.len() < dscale {
            let _ = write!(frac, "{:04}", digit_at(idx));
            idx += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

/// Write decimal `text` in the binary `numeric` wire format.
///
/// # Errors
/// Returns an error when `text` is not a plain decimal number.
pub fn encode_numeric(text: &str, out: &mut BytesMut) -> Result<(), BoxError> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("nan") {
        out.put_u16(0);
        out.put_i16(0);
        out.put_u16(NUMERIC_NAN);
        out.put_u16(0);
        return Ok(());
    }

    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(format!("`{text}` is not a decimal number").into());
    }

    let int_part = int_part.trim_start_matches('0');
    let int_pad = (4 - int_part.len() % 4) % 4;
    let frac_pad = (4 - frac_part.len() % 4) % 4;
    let mut padded = String::with_capacity(int_pad + int_part.len() + frac_part.len() + frac_pad);
    padded.extend(std::iter::repeat_n('0', int_pad));
    padded.push_str(int_part);
    padded.push_str(frac_part);
    padded.extend(std::iter::repeat_n('0', frac_pad));

    let mut groups = padded
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
        })
        .collect::<Vec<u16>>();

    let int_groups = (int_pad + int_part.len()) / 4;
    let mut weight = i32::try_from(int_groups)? - 1;
    let leading = groups.iter().take_while(|g| **g == 0).count();
    groups.drain(..leading);
    weight -= i32::try_from(leading)?;
    while groups.last() == Some(&0) {
        groups.pop();
    }
    if groups.is_empty() {
        weight = 0;
    }

    out.put_u16(u16::try_from(groups.len())?);
    out.put_i16(i16::try_from(weight)?);
    out.put_u16(if negative && !groups.is_empty() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    });
    out.put_u16(u16::try_from(frac_part.len())?);
    for group in groups {
        out.put_u16(group);
    }
    Ok(())
}

fn bind_text(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => match s.trim() {
            "t" | "true" | "TRUE" | "1" | "on" | "yes" => true.to_sql(ty, out),
            "f" | "false" | "FALSE" | "0" | "off" | "no" => false.to_sql(ty, out),
            other => Err(format!("`{other}` is not a boolean").into()),
        },
        Type::INT2 => s.trim().parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => s.trim().parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => s.trim().parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => encode_numeric(s, out).map(|()| IsNull::No),
        Type::DATE => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?.to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(s)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_timestamptz(s)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        Type::CHAR => match s.as_bytes() {
            [byte] => i8::from_ne_bytes([*byte]).to_sql(ty, out),
            _ => Err(format!("`{s}` is not a single-byte \"char\"").into()),
        },
        Type::TIME => parse_time(s)?.to_sql(ty, out),
        Type::UUID => {
            out.put_slice(&parse_uuid(s)?);
            Ok(IsNull::No)
        }
        Type::INET => encode_inet(s, false, out).map(|()| IsNull::No),
        Type::CIDR => encode_inet(s, true, out).map(|()| IsNull::No),
        // Text-like and enum types share the UTF-8 wire format.
        _ if is_text_type(ty) || matches!(ty.kind(), Kind::Enum(_)) => {
            out.put_slice(s.as_bytes());
            Ok(IsNull::No)
        }
        _ => Err(format!("cannot bind `{s}` to parameter of type {ty}").into()),
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, BoxError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(Into::into)
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(Into::into)
}

fn parse_timestamptz(s: &str) -> Result<DateTime<FixedOffset>, BoxError> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map_err(Into::into)
}

impl ToSql for DbValue {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            DbValue::Nil => Ok(IsNull::Yes),
            DbValue::Integer(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::OID => u32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::BOOL => (*i != 0).to_sql(ty, out),
                _ => bind_text(&i.to_string(), ty, out),
            },
            DbValue::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 | Type::BOOL => {
                    Err(format!("cannot bind float {f} to {ty}").into())
                }
                _ => bind_text(&f.to_string(), ty, out),
            },
            DbValue::String(s) => bind_text(s, ty, out),
            DbValue::Boolean(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                Type::INT2 => i16::from(*b).to_sql(ty, out),
                Type::INT4 => i32::from(*b).to_sql(ty, out),
                Type::INT8 => i64::from(*b).to_sql(ty, out),
                _ => bind_text(if *b { "true" } else { "false" }, ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_bytes(text: &str) -> Vec<u8> {
        let mut out = BytesMut::new();
        encode_numeric(text, &mut out).unwrap();
        out.to_vec()
    }

    #[test]
    fn numeric_wire_format_matches_server_layout() {
        // 12345.678 = [1, 2345, 6780], weight 1, dscale 3
        let bytes = numeric_bytes("12345.678");
        assert_eq!(
            bytes,
            vec![0, 3, 0, 1, 0, 0, 0, 3, 0, 1, 0x09, 0x29, 0x1a, 0x7c]
        );
        assert_eq!(decode_numeric(&bytes).unwrap(), "12345.678");
    }

    #[test]
    fn numeric_small_fractions_and_signs() {
        assert_eq!(decode_numeric(&numeric_bytes("-0.00012")).unwrap(), "-0.00012");
        assert_eq!(decode_numeric(&numeric_bytes("100000000")).unwrap(), "100000000");
        assert_eq!(decode_numeric(&numeric_bytes("0")).unwrap(), "0");
        assert_eq!(decode_numeric(&numeric_bytes("NaN")).unwrap(), "NaN");
        assert!(encode_numeric("12a", &mut BytesMut::new()).is_err());
    }

    #[test]
    fn integers_narrow_with_range_checks() {
        let mut out = BytesMut::new();
        assert!(DbValue::Integer(70_000).to_sql(&Type::INT2, &mut out).is_err());
        out.clear();
        DbValue::Integer(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(out.to_vec(), vec![0, 0, 0, 7]);
    }

    #[test]
    fn type_tags_pick_kinds() {
        assert_eq!(PgType::from_type(&Type::VARCHAR), PgType::Text);
        assert_eq!(PgType::from_type(&Type::INET), PgType::Inet);
        assert_eq!(PgType::from_type(&Type::CHAR), PgType::Char);
        assert_eq!(PgType::from_type(&Type::TIME), PgType::Time);
        assert_eq!(PgType::from_type(&Type::MONEY), PgType::Other);
        assert_eq!(PgType::from_type(&Type::INT4_ARRAY), PgType::Other);
        assert_eq!(PgType::Numeric.value_kind(), ValueKind::Float);
        assert_eq!(PgType::Int2.buffer_size(), Some(2));
    }

    #[test]
    fn uuid_bytes_format_like_the_server() {
        let raw: Vec<u8> = (0u8..16).collect();
        let text = format_uuid(&raw).unwrap();
        assert_eq!(text, "00010203-0405-0607-0809-0a0b0c0d0e0f");
        assert_eq!(parse_uuid(&text).unwrap().to_vec(), raw);
        assert!(format_uuid(&raw[..15]).is_err());
    }

    #[test]
    fn uuid_text_binds_as_sixteen_bytes() {
        let mut out = BytesMut::new();
        DbValue::String("00010203-0405-0607-0809-0a0b0c0d0e0f".into())
            .to_sql(&Type::UUID, &mut out)
            .unwrap();
        assert_eq!(out.to_vec(), (0u8..16).collect::<Vec<u8>>());

        out.clear();
        assert!(DbValue::String("not-a-uuid".into()).to_sql(&Type::UUID, &mut out).is_err());
    }

    #[test]
    fn time_binds_and_formats() {
        let mut out = BytesMut::new();
        DbValue::String("00:00:01".into()).to_sql(&Type::TIME, &mut out).unwrap();
        assert_eq!(out.to_vec(), 1_000_000i64.to_be_bytes().to_vec());

        let time = NaiveTime::from_sql(&Type::TIME, &1_000_000i64.to_be_bytes()).unwrap();
        assert_eq!(time.format("%H:%M:%S%.f").to_string(), "00:00:01");
    }

    fn interval_bytes(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = micros.to_be_bytes().to_vec();
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    #[test]
    fn intervals_format_like_the_server() {
        let cases = [
            (interval_bytes(0, 0, 0), "00:00:00"),
            (interval_bytes(1_000_000, 0, 0), "00:00:01"),
            (interval_bytes(14_706_500_000, 3, 14), "1 year 2 mons 3 days 04:05:06.5"),
            (interval_bytes(0, -1, 0), "-1 days"),
            (interval_bytes(3_600_000_000, -1, 0), "-1 days +01:00:00"),
            (interval_bytes(-90_000_000, 0, 1), "1 mon -00:01:30"),
        ];
        for (raw, expected) in cases {
            assert_eq!(format_interval(&raw).unwrap(), expected);
        }
        assert!(format_interval(&[0; 8]).is_err());
    }

    #[test]
    fn inet_values_round_trip_through_the_wire_format() {
        let mut out = BytesMut::new();
        encode_inet("192.168.0.1", false, &mut out).unwrap();
        assert_eq!(out.to_vec(), vec![2, 32, 0, 4, 192, 168, 0, 1]);
        assert_eq!(format_inet(&out).unwrap(), "192.168.0.1");

        out.clear();
        encode_inet("10.0.0.0/8", true, &mut out).unwrap();
        assert_eq!(format_inet(&out).unwrap(), "10.0.0.0/8");

        out.clear();
        encode_inet("::1", false, &mut out).unwrap();
        assert_eq!(format_inet(&out).unwrap(), "::1");

        assert!(encode_inet("10.0.0.1/40", false, &mut BytesMut::new()).is_err());
        assert!(format_inet(&[2, 32, 0]).is_err());
    }

    #[test]
    fn char_binds_a_single_byte() {
        let mut out = BytesMut::new();
        DbValue::String("a".into()).to_sql(&Type::CHAR, &mut out).unwrap();
        assert_eq!(out.to_vec(), vec![b'a']);
        assert!(DbValue::String("ab".into()).to_sql(&Type::CHAR, &mut BytesMut::new()).is_err());
    }

    #[test]
    fn unmapped_binary_types_refuse_text() {
        let mut out = BytesMut::new();
        let err = DbValue::String("1 day".into()).to_sql(&Type::INTERVAL, &mut out);
        assert!(err.is_err());
        assert!(out.is_empty());
        assert!(DbValue::String("$1.00".into()).to_sql(&Type::MONEY, &mut out).is_err());
    }
}
