// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Connection strings and provider configuration.
//!
//! Configuration is limited to what statement compilation needs: the
//! dialect and a handful of connection-string switches. Everything else in
//! the connection string is opaque and passed to the driver unchanged.
//!
//! ```rust
//! use entity_sql_core::ConnectionInfo;
//!
//! let info = ConnectionInfo::parse("Server=db;Allow User Variables=True;");
//! assert!(info.allow_user_variables());
//! assert_eq!(info.get("server"), Some("db"));
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::dialect::DatabaseDialect;

/// Parsed `key=value;` connection string.
///
/// Keys are matched case-insensitively, ignoring embedded whitespace, so
/// `Allow User Variables` and `allowuservariables` are the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    raw:    String,
    values: HashMap<String, String>
}

impl ConnectionInfo {
    /// Parse a connection string. Segments without `=` are ignored.
    #[must_use]
    pub fn parse(connection_string: &str) -> Self {
        let values = connection_string
            .split(';')
            .filter_map(|segment| segment.split_once('='))
            .map(|(key, value)| (normalize_key(key), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self {
            raw: connection_string.to_string(),
            values
        }
    }

    /// The original connection string.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.raw
    }

    /// Value of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Boolean switch: `true`, `yes` and `1` are on.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| {
            v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") || v == "1"
        })
    }

    /// MySQL `Allow User Variables` switch, which moves parameters from
    /// `@name` to `?name`.
    #[must_use]
    pub fn allow_user_variables(&self) -> bool {
        self.flag("Allow User Variables")
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Provider configuration as loaded by the application.
///
/// ```rust
/// use entity_sql_core::{DatabaseDialect, ProviderConfig};
///
/// let config: ProviderConfig = serde_json::from_str(
///     r#"{ "provider": "Npgsql", "connection_string": "Host=db", "dialect": "pg" }"#
/// ).unwrap();
/// assert_eq!(config.dialect, Some(DatabaseDialect::PostgreSql));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// Provider invariant name, e.g. `Npgsql` or `System.Data.SqlClient`.
    pub provider:          String,
    /// Connection string handed to the driver.
    pub connection_string: String,
    /// Explicit dialect; resolved from `provider` when absent.
    #[serde(default)]
    pub dialect:           Option<DatabaseDialect>
}

impl ProviderConfig {
    /// Parsed connection string.
    #[must_use]
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::parse(&self.connection_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_and_space_insensitive() {
        let info = ConnectionInfo::parse("Data Source=app.db; AllowUserVariables = yes ;junk");
        assert_eq!(info.get("data source"), Some("app.db"));
        assert_eq!(info.get("DATASOURCE"), Some("app.db"));
        assert!(info.allow_user_variables());
    }

    #[test]
    fn flags_default_off() {
        let info = ConnectionInfo::parse("Server=x;Allow User Variables=false");
        assert!(!info.allow_user_variables());
        assert!(!ConnectionInfo::default().allow_user_variables());
    }

    #[test]
    fn provider_config_without_dialect() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{ "provider": "System.Data.SQLite", "connection_string": "" }"#)
                .unwrap();
        assert_eq!(config.dialect, None);
        assert_eq!(config.connection_info().get("anything"), None);
    }
}
