// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SQLite.

use async_trait::async_trait;

use super::{DatabaseDialect, DialectStrategy, IdentityCapture, InsertParts};
use crate::{error::Result, value::Value};

/// SQLite strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

#[async_trait]
impl DialectStrategy for SqliteDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::Sqlite
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        Ok(match primary_key {
            Some(_) => IdentityCapture::scalar(format!("{}; SELECT last_insert_rowid();", insert.to_sql())),
            None => IdentityCapture::plain(insert)
        })
    }

    /// SQLite integers are signed 64-bit; unsigned 32-bit values are
    /// widened, everything else follows the common coercion.
    fn map_parameter_value(&self, value: Value) -> Value {
        match value {
            Value::U32(v) => Value::I64(i64::from(v)),
            Value::Bool(b) => Value::I32(i32::from(b)),
            Value::Json(json) => Value::String(json.to_string()),
            other => other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityRead, command::Statement, dialect::NO_IDENTITY};

    #[test]
    fn widens_unsigned() {
        assert_eq!(SqliteDialect.map_parameter_value(Value::U32(u32::MAX)), Value::I64(4_294_967_295));
        assert_eq!(SqliteDialect.map_parameter_value(Value::Bool(false)), Value::I32(0));
    }

    #[test]
    fn last_insert_rowid() {
        let insert = InsertParts {
            table:   "[Widget]".into(),
            columns: vec!["[Name]".into()],
            values:  vec!["@p0".into()]
        };
        let capture = SqliteDialect.capture_identity(&insert, Some("Id")).unwrap();
        assert_eq!(
            capture.sql,
            "INSERT INTO [Widget] ([Name]) VALUES (@p0); SELECT last_insert_rowid();"
        );
        assert_eq!(capture.read, IdentityRead::Scalar);
    }

    #[test]
    fn plain_statement_captures_nothing() {
        let statement = Statement::new("INSERT INTO [Log] ([Text]) VALUES ('x')");
        assert_eq!(statement.identity(), &IdentityRead::None);
        assert_eq!(NO_IDENTITY, -1);
    }
}
