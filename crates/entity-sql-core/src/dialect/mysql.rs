// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! MySQL and MariaDB.

use async_trait::async_trait;

use super::{DatabaseDialect, DialectStrategy, IdentityCapture, InsertParts};
use crate::{config::ConnectionInfo, error::Result};

/// MySQL strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

#[async_trait]
impl DialectStrategy for MySqlDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::MySql
    }

    fn quotes(&self) -> (char, char) {
        ('`', '`')
    }

    /// `?` when the connection allows user variables (`@x` then names a
    /// session variable), `@` otherwise.
    fn parameter_prefix(&self, connection: &ConnectionInfo) -> &'static str {
        if connection.allow_user_variables() { "?" } else { "@" }
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        let sql = if insert.columns.is_empty() {
            format!("INSERT INTO {} () VALUES ()", insert.table)
        } else {
            insert.to_sql()
        };
        Ok(match primary_key {
            Some(_) => IdentityCapture::scalar(format!("{sql}; SELECT LAST_INSERT_ID();")),
            None => IdentityCapture {
                sql,
                read: super::IdentityRead::None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_follows_user_variables() {
        let plain = ConnectionInfo::parse("Server=db");
        let vars = ConnectionInfo::parse("Server=db;Allow User Variables=true");
        assert_eq!(MySqlDialect.placeholder("p0", 1, &plain), "@p0");
        assert_eq!(MySqlDialect.placeholder("p0", 1, &vars), "?p0");
    }

    #[test]
    fn backtick_escaping() {
        assert_eq!(MySqlDialect.escape_identifier("order").unwrap(), "`order`");
        assert_eq!(MySqlDialect.escape_identifier("`order`").unwrap(), "`order`");
    }

    #[test]
    fn last_insert_id() {
        let insert = InsertParts {
            table:   "`widget`".into(),
            columns: vec!["`name`".into()],
            values:  vec!["@p0".into()]
        };
        assert_eq!(
            MySqlDialect.capture_identity(&insert, Some("id")).unwrap().sql,
            "INSERT INTO `widget` (`name`) VALUES (@p0); SELECT LAST_INSERT_ID();"
        );
        let empty = InsertParts {
            table:   "`widget`".into(),
            columns: vec![],
            values:  vec![]
        };
        assert_eq!(
            MySqlDialect.capture_identity(&empty, None).unwrap().sql,
            "INSERT INTO `widget` () VALUES ()"
        );
    }
}
