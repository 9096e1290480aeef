// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SQL Server Compact Edition.
//!
//! No `OUTPUT` clause and no multi-statement batches: the identity is read
//! by a second query on the same connection.

use async_trait::async_trait;

use super::{
    DatabaseDialect, DialectStrategy, IdentityCapture, IdentityRead, InsertParts,
    offset_fetch_page, sqlserver::if_exists_sql
};
use crate::{command::ParameterWriter, error::Result, paging::SqlPageStatement};

/// Follow-up query reading the last identity.
const IDENTITY_QUERY: &str = "SELECT @@IDENTITY";

/// SQL Server Compact strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerCeDialect;

#[async_trait]
impl DialectStrategy for SqlServerCeDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::SqlServerCe
    }

    fn exists_sql(&self, table: &str, predicate: &str) -> String {
        if_exists_sql(table, predicate)
    }

    fn build_page_query(
        &self,
        skip: u64,
        take: u64,
        page: &SqlPageStatement,
        parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        offset_fetch_page(skip, take, page, parameters, Some("ORDER BY (SELECT NULL)"))
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        Ok(IdentityCapture {
            sql:  insert.to_sql(),
            read: match primary_key {
                Some(_) => IdentityRead::FollowUpQuery(IDENTITY_QUERY.to_string()),
                None => IdentityRead::None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_by_follow_up_query() {
        let insert = InsertParts {
            table:   "[Widget]".into(),
            columns: vec!["[Name]".into()],
            values:  vec!["@p0".into()]
        };
        let capture = SqlServerCeDialect.capture_identity(&insert, Some("Id")).unwrap();
        assert_eq!(capture.sql, "INSERT INTO [Widget] ([Name]) VALUES (@p0)");
        assert_eq!(capture.read, IdentityRead::FollowUpQuery("SELECT @@IDENTITY".into()));
    }

    #[test]
    fn offset_fetch_binds_skip_then_take() {
        let info = crate::config::ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&SqlServerCeDialect, &info);
        let page = SqlPageStatement::parse("SELECT [Id] FROM [Widget] ORDER BY [Id]");
        let sql = SqlServerCeDialect.build_page_query(3, 4, &page, &mut writer).unwrap();
        assert!(sql.ends_with("ORDER BY [Id] OFFSET @p0 ROWS FETCH NEXT @p1 ROWS ONLY"));
        let slots = writer.into_slots();
        assert_eq!(
            slots[0].source(),
            &crate::command::ParameterSource::Fixed(crate::value::Value::I64(3))
        );
    }

    #[test]
    fn unordered_page_gets_a_neutral_order() {
        let info = crate::config::ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&SqlServerCeDialect, &info);
        let page = SqlPageStatement::parse("SELECT t0.[Id] AS [id] FROM [Widget] t0");
        let sql = SqlServerCeDialect.build_page_query(10, 5, &page, &mut writer).unwrap();
        assert_eq!(
            sql,
            "SELECT t0.[Id] AS [id] FROM [Widget] t0 ORDER BY (SELECT NULL) OFFSET @p0 ROWS FETCH NEXT @p1 ROWS ONLY"
        );
    }
}
