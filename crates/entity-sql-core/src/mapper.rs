// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Row to model conversion.
//!
//! [`FromRow`] is the per-type conversion, [`RowMapper`] the pluggable
//! strategy a repository uses to turn driver rows into values:
//!
//! | Mapper | Requires | Notes |
//! |--------|----------|-------|
//! | [`FromRowMapper`] | `T: FromRow` | Default, no allocation beyond the model |
//! | [`JsonRowMapper`] | `T: DeserializeOwned` | Row rendered as a JSON object, then deserialized |

use std::{fmt, marker::PhantomData};

use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    value::Row
};

/// Build a value from one row.
pub trait FromRow: Sized {
    /// Convert the row.
    ///
    /// # Errors
    ///
    /// [`Error::Mapping`] when a column is missing or has the wrong type.
    fn from_row(row: &Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

/// Strategy turning rows into model values.
pub trait RowMapper<T>: Send + Sync {
    /// Map one row.
    fn map(&self, row: &Row) -> Result<T>;
}

/// Mapper delegating to [`FromRow`].
pub struct FromRowMapper<T>(PhantomData<fn() -> T>);

impl<T> FromRowMapper<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromRowMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FromRowMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromRowMapper")
    }
}

impl<T: FromRow> RowMapper<T> for FromRowMapper<T> {
    fn map(&self, row: &Row) -> Result<T> {
        T::from_row(row)
    }
}

/// Mapper going through `serde`: columns become object keys.
pub struct JsonRowMapper<T>(PhantomData<fn() -> T>);

impl<T> JsonRowMapper<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonRowMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonRowMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonRowMapper")
    }
}

impl<T: DeserializeOwned> RowMapper<T> for JsonRowMapper<T> {
    fn map(&self, row: &Row) -> Result<T> {
        let object: serde_json::Map<String, serde_json::Value> = row
            .columns()
            .iter()
            .zip(row.values())
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::value::Value;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Widget {
        id:    i64,
        name:  String,
        price: Option<f64>
    }

    #[test]
    fn json_mapper_deserializes_row() {
        let row = Row::from_pairs([
            ("id", Value::I64(3)),
            ("name", Value::from("bolt")),
            ("price", Value::Null)
        ]);
        let widget = JsonRowMapper::<Widget>::new().map(&row).unwrap();
        assert_eq!(
            widget,
            Widget {
                id:    3,
                name:  "bolt".into(),
                price: None
            }
        );
    }

    #[test]
    fn json_mapper_reports_shape_errors() {
        let row = Row::from_pairs([("id", Value::from("x"))]);
        let err = JsonRowMapper::<Widget>::new().map(&row).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn from_row_mapper_clones_rows() {
        let row = Row::from_pairs([("a", Value::I32(1))]);
        assert_eq!(FromRowMapper::<Row>::new().map(&row).unwrap(), row);
    }
}
