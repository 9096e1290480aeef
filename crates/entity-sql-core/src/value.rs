// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Parameter and row values exchanged with drivers.
//!
//! [`Value`] is the single currency between the compiler, dialect coercion
//! and the driver boundary. [`Row`] is an ordered list of named values as
//! returned by a query; [`FromValue`] converts values back into Rust types
//! with explicit widening/narrowing checks.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    metadata::ValueType
};

/// A parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Exact decimal in its textual form.
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value)
}

impl Value {
    /// Check for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type tag of a non-null value.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => ValueType::Boolean,
            Self::I16(_) => ValueType::Int16,
            Self::I32(_) => ValueType::Int32,
            Self::I64(_) => ValueType::Int64,
            Self::U32(_) => ValueType::UInt32,
            Self::U64(_) => ValueType::UInt64,
            Self::F32(_) => ValueType::Float32,
            Self::F64(_) => ValueType::Float64,
            Self::Decimal(_) => ValueType::Decimal,
            Self::String(_) => ValueType::String,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Uuid(_) => ValueType::Uuid,
            Self::Date(_) => ValueType::Date,
            Self::Time(_) => ValueType::Time,
            Self::Timestamp(_) => ValueType::Timestamp,
            Self::TimestampTz(_) => ValueType::TimestampTz,
            Self::Json(_) => ValueType::Json
        })
    }

    /// Integer view of any integral value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            Self::U32(v) => Some(i64::from(*v)),
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Decimal(v) | Self::String(v) => v.parse().ok(),
            _ => None
        }
    }

    /// JSON rendering used by [`JsonRowMapper`](crate::mapper::JsonRowMapper).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::from(*v),
            Self::I16(v) => Json::from(*v),
            Self::I32(v) => Json::from(*v),
            Self::I64(v) => Json::from(*v),
            Self::U32(v) => Json::from(*v),
            Self::U64(v) => Json::from(*v),
            Self::F32(v) => Json::from(*v),
            Self::F64(v) => Json::from(*v),
            Self::Decimal(v) | Self::String(v) => Json::from(v.as_str()),
            Self::Bytes(v) => Json::from(v.clone()),
            Self::Uuid(v) => Json::from(v.to_string()),
            Self::Date(v) => Json::from(v.to_string()),
            Self::Time(v) => Json::from(v.to_string()),
            Self::Timestamp(v) => Json::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::TimestampTz(v) => Json::from(v.to_rfc3339()),
            Self::Json(v) => v.clone()
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Conversion failure message for [`FromValue`].
fn mismatch(expected: &str, found: &Value) -> String {
    match found.value_type() {
        Some(t) => format!("expected {expected}, found {t}"),
        None => format!("expected {expected}, found NULL")
    }
}

/// Types that can be read out of a [`Value`].
pub trait FromValue: Sized {
    /// Convert, describing the mismatch on failure.
    fn from_value(value: &Value) -> std::result::Result<Self, String>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => match other.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch("Boolean", other))
            }
        }
    }
}

macro_rules! integer_from_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> std::result::Result<Self, String> {
                    let wide = match value {
                        Value::U64(v) => return <$ty>::try_from(*v)
                            .map_err(|_| format!("{v} is out of range for {}", $name)),
                        other => other.as_i64().ok_or_else(|| mismatch($name, other))?
                    };
                    <$ty>::try_from(wide).map_err(|_| format!("{wide} is out of range for {}", $name))
                }
            }
        )*
    };
}

integer_from_value! {
    i16 => "Int16",
    i32 => "Int32",
    i64 => "Int64",
    u32 => "UInt32",
    u64 => "UInt64",
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::F64(v) => Ok(*v),
            Value::F32(v) => Ok(f64::from(*v)),
            Value::Decimal(v) => v.parse().map_err(|_| mismatch("Float64", value)),
            other => other
                .as_i64()
                .map(|v| v as f64)
                .ok_or_else(|| mismatch("Float64", other))
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::F32(v) => Ok(*v),
            other => f64::from_value(other).map(|v| v as f32)
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::String(v) | Value::Decimal(v) => Ok(v.clone()),
            Value::Uuid(v) => Ok(v.to_string()),
            other => Err(mismatch("String", other))
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(mismatch("Bytes", other))
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::String(v) => Uuid::parse_str(v).map_err(|e| e.to_string()),
            Value::Bytes(v) => Uuid::from_slice(v).map_err(|e| e.to_string()),
            other => Err(mismatch("Uuid", other))
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Date(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.date()),
            Value::String(v) => v.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => Err(mismatch("Date", other))
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Time(v) => Ok(*v),
            Value::String(v) => v.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => Err(mismatch("Time", other))
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            Value::TimestampTz(v) => Ok(v.naive_utc()),
            Value::String(v) => v.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => Err(mismatch("Timestamp", other))
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::TimestampTz(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.and_utc()),
            Value::String(v) => DateTime::parse_from_rfc3339(v)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| e.to_string()),
            other => Err(mismatch("TimestampTz", other))
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::String(v) => serde_json::from_str(v).map_err(|e| e.to_string()),
            other => Ok(other.to_json())
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some)
        }
    }
}

/// One result row: ordered column names with their values.
///
/// Column names are shared between rows of the same result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values:  Vec<Value>
}

impl Row {
    /// Create a row. `columns` and `values` must have the same length.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] on a length mismatch.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::invalid_argument(
                "values",
                format!("{} values for {} columns", values.len(), columns.len())
            ));
        }
        Ok(Self {
            columns,
            values
        })
    }

    /// Build a row from `(name, value)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            columns: columns.into(),
            values
        }
    }

    /// Column names in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by column name; exact match first, then ASCII
    /// case-insensitive (Oracle folds unquoted aliases to upper case).
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(column))
            })?;
        self.values.get(index)
    }

    /// Value by position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Typed read of a column.
    ///
    /// A missing column reads as `NULL`, so `Option<T>` fields tolerate
    /// projections that omit them.
    ///
    /// # Errors
    ///
    /// [`Error::Mapping`] when the conversion fails.
    pub fn try_get<T: FromValue>(&self, column: &str) -> Result<T> {
        let value = self.get(column).unwrap_or(&Value::Null);
        T::from_value(value).map_err(|message| Error::Mapping {
            column: column.to_string(),
            message
        })
    }
}
