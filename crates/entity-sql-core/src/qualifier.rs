// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Identifier escaping and parameter prefixing for one connection.

use crate::{
    config::ConnectionInfo,
    dialect::DatabaseDialect,
    error::{Result, require_non_blank}
};

/// Dialect naming rules bound to a connection.
///
/// ```rust
/// use entity_sql_core::{ConnectionInfo, DatabaseDialect, NameQualifier};
///
/// let oracle = NameQualifier::new(DatabaseDialect::Oracle, &ConnectionInfo::default());
/// assert_eq!(oracle.escape("Widget").unwrap(), "\"WIDGET\"");
/// assert_eq!(oracle.add_parameter_prefix("id").unwrap(), ":id");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameQualifier {
    dialect: DatabaseDialect,
    prefix:  &'static str
}

impl NameQualifier {
    pub fn new(dialect: DatabaseDialect, connection: &ConnectionInfo) -> Self {
        Self {
            dialect,
            prefix: dialect.strategy().parameter_prefix(connection)
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> DatabaseDialect {
        self.dialect
    }

    /// Parameter prefix in effect.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Quote an identifier for this dialect; idempotent.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) for blank
    /// input.
    pub fn escape(&self, identifier: &str) -> Result<String> {
        self.dialect.strategy().escape_identifier(identifier)
    }

    /// Escaped `container.entity`.
    pub fn escape_table(&self, container: &str, entity: &str) -> Result<String> {
        self.dialect.strategy().escape_table(container, entity)
    }

    /// Prefix a parameter name; already prefixed names are unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) for blank
    /// input.
    pub fn add_parameter_prefix(&self, name: &str) -> Result<String> {
        require_non_blank("name", name)?;
        let name = name.trim();
        if name.starts_with(self.prefix) {
            return Ok(name.to_string());
        }
        Ok(format!("{}{name}", self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qualifier(dialect: DatabaseDialect) -> NameQualifier {
        NameQualifier::new(dialect, &ConnectionInfo::default())
    }

    #[test]
    fn quoting_per_dialect() {
        let cases = [
            (DatabaseDialect::SqlServer, "[Name]"),
            (DatabaseDialect::SqlServerCe, "[Name]"),
            (DatabaseDialect::Sqlite, "[Name]"),
            (DatabaseDialect::PostgreSql, "\"Name\""),
            (DatabaseDialect::Firebird, "\"Name\""),
            (DatabaseDialect::Oracle, "\"NAME\""),
            (DatabaseDialect::MySql, "`Name`")
        ];
        for (dialect, expected) in cases {
            let q = qualifier(dialect);
            let once = q.escape("Name").unwrap();
            assert_eq!(once, expected, "{dialect}");
            assert_eq!(q.escape(&once).unwrap(), once, "{dialect} is not idempotent");
        }
    }

    #[test]
    fn prefixes() {
        assert_eq!(qualifier(DatabaseDialect::SqlServer).add_parameter_prefix("id").unwrap(), "@id");
        assert_eq!(qualifier(DatabaseDialect::Oracle).add_parameter_prefix("id").unwrap(), ":id");
        let mysql = NameQualifier::new(
            DatabaseDialect::MySql,
            &ConnectionInfo::parse("Allow User Variables=true")
        );
        assert_eq!(mysql.add_parameter_prefix("id").unwrap(), "?id");
        assert_eq!(mysql.add_parameter_prefix("?id").unwrap(), "?id");
    }

    #[test]
    fn blank_input_rejected() {
        let q = qualifier(DatabaseDialect::PostgreSql);
        assert!(q.escape("").unwrap_err().is_invalid_argument());
        assert!(q.add_parameter_prefix(" ").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn table_with_and_without_container() {
        let q = qualifier(DatabaseDialect::SqlServer);
        assert_eq!(q.escape_table("dbo", "Widget").unwrap(), "[dbo].[Widget]");
        assert_eq!(q.escape_table("", "Widget").unwrap(), "[Widget]");
    }
}
