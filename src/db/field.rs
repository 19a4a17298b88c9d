//! Field module - typed scalar values read from or bound to SQLite

use std::fmt;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// SQLite storage classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteType {
    /// Null type
    Null,
    /// Integer type (INTEGER)
    Integer,
    /// Real/Float type (REAL)
    Real,
    /// Text type (TEXT)
    Text,
    /// Blob/Binary type (BLOB)
    Blob,
}

impl SqliteType {
    /// Get the SQLite type name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            SqliteType::Null => "NULL",
            SqliteType::Integer => "INTEGER",
            SqliteType::Real => "REAL",
            SqliteType::Text => "TEXT",
            SqliteType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for SqliteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed value: one column of one row, or one bound parameter.
///
/// NULL is its own variant, so `Integer(0)` is never mistaken for NULL.
/// Stored TEXT that is not valid UTF-8 is read as `Blob` with its original bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Field {
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn kind(&self) -> SqliteType {
        match self {
            Field::Null => SqliteType::Null,
            Field::Integer(_) => SqliteType::Integer,
            Field::Real(_) => SqliteType::Real,
            Field::Text(_) => SqliteType::Text,
            Field::Blob(_) => SqliteType::Blob,
        }
    }

    /// Typed read; fails with [`Error::TypeMismatch`] when the value cannot be
    /// converted without loss.
    pub fn get<T: FromField>(&self) -> Result<T> {
        T::from_field(self)
    }

    /// JSON rendering used by the JS bindings. Blobs become base64 strings.
    pub fn to_json(&self) -> Value {
        match self {
            Field::Null => Value::Null,
            Field::Integer(i) => Value::Number((*i).into()),
            Field::Real(f) => Value::Number(Number::from_f64(*f).unwrap_or(Number::from(0))),
            Field::Text(t) => Value::String(t.clone()),
            Field::Blob(b) => Value::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                b,
            )),
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => f.write_str("NULL"),
            Field::Integer(i) => write!(f, "{}", i),
            Field::Real(r) => write!(f, "{}", r),
            Field::Text(t) => f.write_str(t),
            Field::Blob(b) => {
                f.write_str("x'")?;
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<ValueRef<'_>> for Field {
    fn from(value_ref: ValueRef<'_>) -> Self {
        match value_ref {
            ValueRef::Null => Field::Null,
            ValueRef::Integer(i) => Field::Integer(i),
            ValueRef::Real(r) => Field::Real(r),
            // TEXT that is not valid UTF-8 keeps its bytes instead of being rewritten
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(text) => Field::Text(text.to_string()),
                Err(_) => Field::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => Field::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Field {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Field::Null => ValueRef::Null,
            Field::Integer(i) => ValueRef::Integer(*i),
            Field::Real(r) => ValueRef::Real(*r),
            Field::Text(t) => ValueRef::Text(t.as_bytes()),
            Field::Blob(b) => ValueRef::Blob(b),
        }))
    }
}

macro_rules! field_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Field {
            fn from(v: $t) -> Self {
                Field::Integer(i64::from(v))
            }
        })*
    };
}

field_from_int!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Real(v)
    }
}

impl From<f32> for Field {
    fn from(v: f32) -> Self {
        Field::Real(f64::from(v))
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Text(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Text(v.to_string())
    }
}

impl From<&String> for Field {
    fn from(v: &String) -> Self {
        Field::Text(v.clone())
    }
}

impl From<Vec<u8>> for Field {
    fn from(v: Vec<u8>) -> Self {
        Field::Blob(v)
    }
}

impl From<&[u8]> for Field {
    fn from(v: &[u8]) -> Self {
        Field::Blob(v.to_vec())
    }
}

impl From<&Vec<u8>> for Field {
    fn from(v: &Vec<u8>) -> Self {
        Field::Blob(v.clone())
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(v: Option<T>) -> Self {
        v.map_or(Field::Null, Into::into)
    }
}

// 2^63, exactly representable as f64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

// Largest magnitude up to which every integer has an exact f64.
const F64_EXACT: u64 = 1 << 53;

/// Conversion out of a [`Field`] into a host type.
pub trait FromField: Sized {
    fn from_field(field: &Field) -> Result<Self>;
}

impl FromField for Field {
    fn from_field(field: &Field) -> Result<Self> {
        Ok(field.clone())
    }
}

impl FromField for i64 {
    fn from_field(field: &Field) -> Result<Self> {
        match field {
            Field::Integer(i) => Ok(*i),
            Field::Real(r) if r.fract() == 0.0 && *r >= -I64_BOUND && *r < I64_BOUND => Ok(*r as i64),
            Field::Text(t) => t.trim().parse().map_err(|_| field.mismatch("i64")),
            _ => Err(field.mismatch("i64")),
        }
    }
}

impl FromField for i32 {
    fn from_field(field: &Field) -> Result<Self> {
        let wide = i64::from_field(field).map_err(|_| field.mismatch("i32"))?;
        i32::try_from(wide).map_err(|_| field.mismatch("i32"))
    }
}

impl FromField for u32 {
    fn from_field(field: &Field) -> Result<Self> {
        let wide = i64::from_field(field).map_err(|_| field.mismatch("u32"))?;
        u32::try_from(wide).map_err(|_| field.mismatch("u32"))
    }
}

impl FromField for bool {
    fn from_field(field: &Field) -> Result<Self> {
        match field {
            Field::Integer(i) => Ok(*i != 0),
            _ => Err(field.mismatch("bool")),
        }
    }
}

impl FromField for f64 {
    fn from_field(field: &Field) -> Result<Self> {
        match field {
            Field::Integer(i) if i.unsigned_abs() <= F64_EXACT => Ok(*i as f64),
            Field::Real(r) => Ok(*r),
            Field::Text(t) => t.trim().parse().map_err(|_| field.mismatch("f64")),
            _ => Err(field.mismatch("f64")),
        }
    }
}

impl FromField for String {
    fn from_field(field: &Field) -> Result<Self> {
        match field {
            Field::Text(t) => Ok(t.clone()),
            Field::Integer(i) => Ok(i.to_string()),
            Field::Real(r) => Ok(r.to_string()),
            Field::Blob(b) => String::from_utf8(b.clone()).map_err(|_| field.mismatch("String")),
            Field::Null => Err(field.mismatch("String")),
        }
    }
}

impl FromField for Vec<u8> {
    fn from_field(field: &Field) -> Result<Self> {
        match field {
            Field::Blob(b) => Ok(b.clone()),
            Field::Text(t) => Ok(t.as_bytes().to_vec()),
            _ => Err(field.mismatch("Vec<u8>")),
        }
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(field: &Field) -> Result<Self> {
        match field {
            Field::Null => Ok(None),
            _ => T::from_field(field).map(Some),
        }
    }
}
