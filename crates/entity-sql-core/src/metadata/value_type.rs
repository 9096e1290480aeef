// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Driver-independent value type tags.
//!
//! Attributes carry a [`ValueType`] instead of a Rust type so that the
//! compiler and dialects can reason about columns without generics.
//! [`SqlType`] connects the two worlds for generated metadata.
//!
//! # Type Table
//!
//! | Rust Type | Tag |
//! |-----------|-----|
//! | `bool` | `Boolean` |
//! | `i16` / `i32` / `i64` | `Int16` / `Int32` / `Int64` |
//! | `u32` / `u64` | `UInt32` / `UInt64` |
//! | `f32` / `f64` | `Float32` / `Float64` |
//! | `String` | `String` |
//! | `Uuid` | `Uuid` |
//! | `NaiveDate` / `NaiveTime` | `Date` / `Time` |
//! | `NaiveDateTime` / `DateTime<Utc>` | `Timestamp` / `TimestampTz` |
//! | `Vec<u8>` | `Bytes` |
//! | `serde_json::Value` | `Json` |
//! | `Option<T>` | tag of `T`, nullable |

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// Value type tag of a mapped attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `true` / `false`.
    Boolean,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// Single precision float.
    Float32,
    /// Double precision float.
    Float64,
    /// Exact decimal carried as text.
    Decimal,
    /// Unicode text.
    String,
    /// 128-bit UUID.
    Uuid,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Timestamp without zone.
    Timestamp,
    /// Timestamp in UTC.
    TimestampTz,
    /// Raw bytes.
    Bytes,
    /// JSON document.
    Json
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Rust types that map onto a [`ValueType`].
///
/// Implemented for every type the derive macro accepts as a field type.
pub trait SqlType {
    /// Tag describing the column.
    const VALUE_TYPE: ValueType;

    /// Whether `NULL` is a legal value.
    const NULLABLE: bool = false;
}

macro_rules! sql_type {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl SqlType for $ty {
                const VALUE_TYPE: ValueType = ValueType::$tag;
            }
        )*
    };
}

sql_type! {
    bool => Boolean,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
}

impl<T: SqlType> SqlType for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;
    const NULLABLE: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_is_nullable() {
        assert_eq!(<Option<i64> as SqlType>::VALUE_TYPE, ValueType::Int64);
        assert!(<Option<i64> as SqlType>::NULLABLE);
        assert!(!<i64 as SqlType>::NULLABLE);
    }

    #[test]
    fn chrono_types() {
        assert_eq!(
            <DateTime<Utc> as SqlType>::VALUE_TYPE,
            ValueType::TimestampTz
        );
        assert_eq!(<NaiveDate as SqlType>::VALUE_TYPE, ValueType::Date);
    }

    #[test]
    fn display_uses_variant_name() {
        assert_eq!(ValueType::UInt32.to_string(), "UInt32");
    }
}
