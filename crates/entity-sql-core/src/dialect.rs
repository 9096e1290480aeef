// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Per-engine SQL strategies.
//!
//! [`DatabaseDialect`] is a closed set of supported engines; each variant
//! dispatches to one [`DialectStrategy`] implementation. The trait carries
//! the common behaviour as default methods and every engine overrides only
//! what differs.
//!
//! | Dialect | Identifier | Parameter | Paging | Identity capture |
//! |---------|------------|-----------|--------|------------------|
//! | SQL Server | `[x]` | `@p0` | `ROW_NUMBER()` window | `OUTPUT INSERTED.[id]` |
//! | SQL Server Compact | `[x]` | `@p0` | `OFFSET .. FETCH` | `SELECT @@IDENTITY` follow-up |
//! | PostgreSQL | `"x"` | `$1` | `LIMIT .. OFFSET` | `RETURNING "id" AS NewID` |
//! | Oracle | `"X"` | `:p0` | `ROW_NUMBER()` window | `RETURNING "ID" INTO :newid` |
//! | MySQL | `` `x` `` | `@p0` / `?p0` | `LIMIT .. OFFSET` | `; SELECT LAST_INSERT_ID();` |
//! | SQLite | `[x]` | `@p0` | `LIMIT .. OFFSET` | `; SELECT last_insert_rowid();` |
//! | Firebird | `"x"` | `@p0` | `OFFSET .. FETCH` | `RETURNING "id"` |
//!
//! # Example
//!
//! ```rust
//! use entity_sql_core::{ConnectionInfo, DatabaseDialect};
//!
//! let dialect = DatabaseDialect::from_name("pg").unwrap();
//! assert_eq!(dialect, DatabaseDialect::PostgreSql);
//! assert_eq!(dialect.strategy().escape_identifier("Name").unwrap(), "\"Name\"");
//! assert_eq!(
//!     dialect.strategy().placeholder("p0", 1, &ConnectionInfo::default()),
//!     "$1"
//! );
//! ```

mod firebird;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;
mod sqlserver_ce;

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use self::{
    firebird::FirebirdDialect, mysql::MySqlDialect, oracle::OracleDialect,
    postgres::PostgreSqlDialect, sqlite::SqliteDialect, sqlserver::SqlServerDialect,
    sqlserver_ce::SqlServerCeDialect
};
use crate::{
    command::{ParameterWriter, Statement},
    config::ConnectionInfo,
    driver::Connection,
    error::{Error, Result, require_non_blank},
    metadata::ValueType,
    paging::{SqlPageStatement, strip_select, unqualify_order_by},
    structured::JsonInsertPlan,
    value::Value
};

/// Sentinel identity returned when an insert does not capture one.
pub const NO_IDENTITY: i64 = -1;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseDialect {
    /// Microsoft SQL Server.
    #[serde(rename = "sqlserver", alias = "mssql")]
    SqlServer,
    /// SQL Server Compact Edition.
    #[serde(rename = "sqlserverce", alias = "sqlce")]
    SqlServerCe,
    /// PostgreSQL.
    #[serde(rename = "postgres", alias = "postgresql", alias = "pg")]
    PostgreSql,
    /// Oracle Database.
    #[serde(rename = "oracle")]
    Oracle,
    /// MySQL / MariaDB.
    #[serde(rename = "mysql", alias = "mariadb")]
    MySql,
    /// SQLite.
    #[serde(rename = "sqlite")]
    Sqlite,
    /// Firebird.
    #[serde(rename = "firebird")]
    Firebird
}

impl DatabaseDialect {
    /// Every supported dialect.
    pub const ALL: [Self; 7] = [
        Self::SqlServer,
        Self::SqlServerCe,
        Self::PostgreSql,
        Self::Oracle,
        Self::MySql,
        Self::Sqlite,
        Self::Firebird
    ];

    /// Parse a dialect name or alias, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.trim().to_lowercase().as_str() {
            "sqlserver" | "mssql" => Self::SqlServer,
            "sqlserverce" | "sqlce" => Self::SqlServerCe,
            "postgres" | "postgresql" | "pg" => Self::PostgreSql,
            "oracle" => Self::Oracle,
            "mysql" | "mariadb" => Self::MySql,
            "sqlite" => Self::Sqlite,
            "firebird" => Self::Firebird,
            _ => return None
        })
    }

    /// Dialect of a well-known ADO-style provider invariant name.
    #[must_use]
    pub fn from_provider(invariant: &str) -> Option<Self> {
        let lower = invariant.to_lowercase();
        Some(if lower.contains("sqlserverce") {
            Self::SqlServerCe
        } else if lower.contains("sqlclient") {
            Self::SqlServer
        } else if lower.contains("npgsql") || lower.contains("postgres") {
            Self::PostgreSql
        } else if lower.contains("oracle") {
            Self::Oracle
        } else if lower.contains("mysql") {
            Self::MySql
        } else if lower.contains("sqlite") {
            Self::Sqlite
        } else if lower.contains("firebird") {
            Self::Firebird
        } else {
            return Self::from_name(invariant);
        })
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::SqlServerCe => "sqlserverce",
            Self::PostgreSql => "postgres",
            Self::Oracle => "oracle",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Firebird => "firebird"
        }
    }

    /// The strategy implementing this dialect.
    #[must_use]
    pub fn strategy(&self) -> &'static dyn DialectStrategy {
        match self {
            Self::SqlServer => &SqlServerDialect,
            Self::SqlServerCe => &SqlServerCeDialect,
            Self::PostgreSql => &PostgreSqlDialect,
            Self::Oracle => &OracleDialect,
            Self::MySql => &MySqlDialect,
            Self::Sqlite => &SqliteDialect,
            Self::Firebird => &FirebirdDialect
        }
    }

    /// Check if this is one of the SQL Server family.
    #[must_use]
    pub const fn is_sql_server(&self) -> bool {
        matches!(self, Self::SqlServer | Self::SqlServerCe)
    }
}

impl fmt::Display for DatabaseDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatabaseDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::invalid_argument("dialect", format!("unknown dialect `{s}`")))
    }
}

/// Column list and value placeholders of an INSERT, already escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertParts {
    /// Escaped table name.
    pub table:   String,
    /// Escaped column names.
    pub columns: Vec<String>,
    /// Placeholders, one per column.
    pub values:  Vec<String>
}

impl InsertParts {
    /// `INSERT INTO t (a, b) VALUES (@p0, @p1)`, or `DEFAULT VALUES`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.to_sql_with_output(None)
    }

    /// Like [`to_sql`](Self::to_sql) with a clause between the column list
    /// and `VALUES` (SQL Server `OUTPUT`).
    #[must_use]
    pub fn to_sql_with_output(&self, output: Option<&str>) -> String {
        let mut sql = format!("INSERT INTO {}", self.table);
        if !self.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.columns.join(", ")));
        }
        if let Some(output) = output {
            sql.push(' ');
            sql.push_str(output);
        }
        if self.columns.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            sql.push_str(&format!(" VALUES ({})", self.values.join(", ")));
        }
        sql
    }
}

/// How an executed insert reports the generated identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityRead {
    /// No capture; the insert runs as a non-query and yields [`NO_IDENTITY`].
    #[default]
    None,
    /// The statement returns the identity as a scalar.
    Scalar,
    /// The identity is written into this output parameter.
    OutParameter(String),
    /// A second query, on the same connection, returns the identity.
    FollowUpQuery(String)
}

/// Insert SQL with its identity read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCapture {
    /// Full insert statement text.
    pub sql:  String,
    /// How to read the identity after execution.
    pub read: IdentityRead
}

impl IdentityCapture {
    /// The plain insert, capturing nothing.
    #[must_use]
    pub fn plain(insert: &InsertParts) -> Self {
        Self {
            sql:  insert.to_sql(),
            read: IdentityRead::None
        }
    }

    /// Capture read as a scalar from `sql`.
    pub fn scalar(sql: impl Into<String>) -> Self {
        Self {
            sql:  sql.into(),
            read: IdentityRead::Scalar
        }
    }
}

/// Engine-specific SQL generation and execution hooks.
///
/// Methods are pure unless they take a [`Connection`]; none of them
/// swallow driver errors.
#[async_trait]
pub trait DialectStrategy: Send + Sync + fmt::Debug {
    /// The dialect this strategy implements.
    fn kind(&self) -> DatabaseDialect;

    /// Opening and closing identifier quotes.
    fn quotes(&self) -> (char, char) {
        ('[', ']')
    }

    /// Quote an identifier. Already quoted input is returned unchanged and
    /// embedded closing quotes are doubled.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for blank identifiers.
    fn escape_identifier(&self, identifier: &str) -> Result<String> {
        require_non_blank("identifier", identifier)?;
        let (open, close) = self.quotes();
        Ok(quote(identifier, open, close))
    }

    /// Escaped `container.entity`, or `entity` for an empty container.
    fn escape_table(&self, container: &str, entity: &str) -> Result<String> {
        let entity = self.escape_identifier(entity)?;
        if container.trim().is_empty() {
            return Ok(entity);
        }
        Ok(format!("{}.{entity}", self.escape_identifier(container)?))
    }

    /// Parameter prefix for this connection.
    fn parameter_prefix(&self, _connection: &ConnectionInfo) -> &'static str {
        "@"
    }

    /// Placeholder text of the parameter `name` at 1-based `position`.
    fn placeholder(&self, name: &str, _position: usize, connection: &ConnectionInfo) -> String {
        format!("{}{name}", self.parameter_prefix(connection))
    }

    /// `SELECT EXISTS(SELECT 1 FROM {table} WHERE {predicate})`.
    fn exists_sql(&self, table: &str, predicate: &str) -> String {
        format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {predicate})")
    }

    /// Rewrite `page` to return `take` rows after skipping `skip`,
    /// appending the bound values to `parameters`.
    ///
    /// The default appends `LIMIT take OFFSET skip`.
    fn build_page_query(
        &self,
        skip: u64,
        take: u64,
        page: &SqlPageStatement,
        parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        let limit = parameters.push_value(to_i64(take)?);
        let offset = parameters.push_value(to_i64(skip)?);
        Ok(format!("{} LIMIT {limit} OFFSET {offset}", page.sql()))
    }

    /// Insert text that reports the identity column `primary_key`.
    ///
    /// Without a primary key the plain insert is returned with
    /// [`IdentityRead::None`].
    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture>;

    /// Execute an insert and return the captured identity, or
    /// [`NO_IDENTITY`] when the statement captures none.
    async fn execute_insert(
        &self,
        connection: &mut (dyn Connection + '_),
        statement: &Statement
    ) -> Result<Value> {
        match statement.identity() {
            IdentityRead::None => {
                connection.execute(statement).await?;
                Ok(Value::I64(NO_IDENTITY))
            }
            IdentityRead::Scalar => Ok(connection.query_scalar(statement).await?.unwrap_or(Value::Null)),
            IdentityRead::OutParameter(name) => {
                let outcome = connection.execute(statement).await?;
                Ok(outcome.output(name).cloned().unwrap_or(Value::Null))
            }
            IdentityRead::FollowUpQuery(sql) => {
                connection.execute(statement).await?;
                let follow_up = Statement::new(sql.as_str());
                Ok(connection.query_scalar(&follow_up).await?.unwrap_or(Value::Null))
            }
        }
    }

    /// Coerce a parameter value for the driver. Booleans become `1`/`0`
    /// and JSON documents are passed as text.
    fn map_parameter_value(&self, value: Value) -> Value {
        match value {
            Value::Bool(b) => Value::I32(i32::from(b)),
            Value::Json(json) => Value::String(json.to_string()),
            other => other
        }
    }

    /// Adjust a statement right before execution.
    fn pre_execute(&self, _statement: &mut Statement) {}

    /// Native column type used when expanding a JSON recordset.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMapping`] for types without a representation.
    fn recordset_type_name(&self, value_type: ValueType) -> Result<&'static str> {
        Err(Error::TypeMapping {
            value_type,
            dialect: self.kind()
        })
    }

    /// Render a structured JSON insert.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] on engines without server-side JSON
    /// expansion.
    fn render_json_insert(
        &self,
        plan: &JsonInsertPlan<'_>,
        _parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        Err(Error::configuration(
            plan.table(),
            format!("structured JSON inserts are not supported by {}", self.kind())
        ))
    }
}

/// Quote `identifier` unless it already is.
pub(crate) fn quote(identifier: &str, open: char, close: char) -> String {
    let trimmed = identifier.trim();
    if trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
        return trimmed.to_string();
    }
    let doubled: String = trimmed
        .chars()
        .flat_map(|c| {
            let twice = c == close;
            std::iter::once(c).chain(twice.then_some(c))
        })
        .collect();
    format!("{open}{doubled}{close}")
}

pub(crate) fn to_i64(n: u64) -> Result<i64> {
    i64::try_from(n).map_err(|_| Error::invalid_argument("page", format!("{n} is out of range")))
}

/// `ROW_NUMBER()` window paging shared by SQL Server and Oracle.
///
/// ```text
/// SELECT * FROM (SELECT ROW_NUMBER() OVER (<order>) AS rn, <projection ...>) page_paged
/// WHERE rn > <skip> AND rn <= <skip + take>
/// ```
///
/// A `SELECT DISTINCT` is nested once more so that the distinct set is
/// computed before rows are numbered. `default_order` is the window order
/// used when the statement has none.
pub(crate) fn row_number_page(
    skip: u64,
    take: u64,
    page: &SqlPageStatement,
    parameters: &mut ParameterWriter<'_>,
    default_order: &str
) -> Result<String> {
    let first = to_i64(skip)?;
    let last = to_i64(skip.saturating_add(take))?;

    let (order_by, inner) = if page.is_distinct() {
        let order_by = page
            .order_by()
            .map_or_else(|| default_order.to_string(), unqualify_order_by);
        let inner = format!("page_inner.* FROM ({}) page_inner", page.select_removed());
        (order_by, inner)
    } else {
        let order_by = page.order_by().unwrap_or(default_order).to_string();
        (order_by, strip_select(page.select_removed(), false).to_string())
    };

    let lower = parameters.push_value(first);
    let upper = parameters.push_value(last);
    Ok(format!(
        "SELECT * FROM (SELECT ROW_NUMBER() OVER ({order_by}) AS rn, {inner}) page_paged WHERE rn > {lower} AND rn <= {upper}"
    ))
}

/// `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` paging.
///
/// `default_order` is appended when the statement has no ORDER BY, for
/// engines that reject OFFSET without one.
pub(crate) fn offset_fetch_page(
    skip: u64,
    take: u64,
    page: &SqlPageStatement,
    parameters: &mut ParameterWriter<'_>,
    default_order: Option<&str>
) -> Result<String> {
    let offset = parameters.push_value(to_i64(skip)?);
    let fetch = parameters.push_value(to_i64(take)?);
    let order_by = match (page.order_by(), default_order) {
        (None, Some(order)) => format!(" {order}"),
        _ => String::new()
    };
    Ok(format!(
        "{}{order_by} OFFSET {offset} ROWS FETCH NEXT {fetch} ROWS ONLY",
        page.sql()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases() {
        assert_eq!(DatabaseDialect::from_name("PostgreSQL"), Some(DatabaseDialect::PostgreSql));
        assert_eq!(DatabaseDialect::from_name("mssql"), Some(DatabaseDialect::SqlServer));
        assert_eq!(DatabaseDialect::from_name("db2"), None);
        assert!("db2".parse::<DatabaseDialect>().is_err());
        for dialect in DatabaseDialect::ALL {
            assert_eq!(DatabaseDialect::from_name(&dialect.to_string()), Some(dialect));
            assert_eq!(dialect.strategy().kind(), dialect);
        }
    }

    #[test]
    fn serde_uses_canonical_names() {
        assert_eq!(serde_json::to_string(&DatabaseDialect::PostgreSql).unwrap(), "\"postgres\"");
        let parsed: DatabaseDialect = serde_json::from_str("\"mssql\"").unwrap();
        assert_eq!(parsed, DatabaseDialect::SqlServer);
    }

    #[test]
    fn provider_invariants() {
        assert_eq!(DatabaseDialect::from_provider("Npgsql"), Some(DatabaseDialect::PostgreSql));
        assert_eq!(
            DatabaseDialect::from_provider("System.Data.SqlClient"),
            Some(DatabaseDialect::SqlServer)
        );
        assert_eq!(
            DatabaseDialect::from_provider("System.Data.SqlServerCe.4.0"),
            Some(DatabaseDialect::SqlServerCe)
        );
        assert_eq!(
            DatabaseDialect::from_provider("Oracle.ManagedDataAccess.Client"),
            Some(DatabaseDialect::Oracle)
        );
        assert_eq!(DatabaseDialect::from_provider("Acme.Db"), None);
    }

    #[test]
    fn quoting_is_idempotent() {
        let once = quote("Na]me", '[', ']');
        assert_eq!(once, "[Na]]me]");
        assert_eq!(quote(&once, '[', ']'), once);
        assert_eq!(quote("a\"b", '"', '"'), "\"a\"\"b\"");
    }

    #[test]
    fn insert_parts_render() {
        let parts = InsertParts {
            table:   "[T]".into(),
            columns: vec!["[A]".into(), "[B]".into()],
            values:  vec!["@p0".into(), "@p1".into()]
        };
        assert_eq!(parts.to_sql(), "INSERT INTO [T] ([A], [B]) VALUES (@p0, @p1)");

        let empty = InsertParts {
            table:   "[T]".into(),
            columns: vec![],
            values:  vec![]
        };
        assert_eq!(
            empty.to_sql_with_output(Some("OUTPUT INSERTED.[Id]")),
            "INSERT INTO [T] OUTPUT INSERTED.[Id] DEFAULT VALUES"
        );
    }

    #[test]
    fn blank_identifier_rejected() {
        for dialect in DatabaseDialect::ALL {
            assert!(dialect.strategy().escape_identifier("  ").unwrap_err().is_invalid_argument());
        }
    }
}
