// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Oracle Database.
//!
//! Unquoted Oracle identifiers fold to upper case, so escaping upper-cases
//! as well to keep quoted and unquoted references to the same object.

use async_trait::async_trait;

use super::{
    DatabaseDialect, DialectStrategy, IdentityCapture, IdentityRead, InsertParts, quote,
    row_number_page
};
use crate::{
    command::{ParameterWriter, Statement},
    config::ConnectionInfo,
    error::{Error, Result, require_non_blank},
    paging::SqlPageStatement
};

/// Output parameter receiving the generated identity.
const IDENTITY_OUTPUT: &str = "newid";

/// Oracle strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

#[async_trait]
impl DialectStrategy for OracleDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::Oracle
    }

    fn quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn escape_identifier(&self, identifier: &str) -> Result<String> {
        require_non_blank("identifier", identifier)?;
        let trimmed = identifier.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            return Ok(trimmed.to_string());
        }
        Ok(quote(&trimmed.to_uppercase(), '"', '"'))
    }

    fn parameter_prefix(&self, _connection: &ConnectionInfo) -> &'static str {
        ":"
    }

    fn exists_sql(&self, table: &str, predicate: &str) -> String {
        format!("SELECT CASE WHEN EXISTS(SELECT 1 FROM {table} WHERE {predicate}) THEN 1 ELSE 0 END FROM DUAL")
    }

    /// `ROW_NUMBER()` paging. A bare `*` cannot share a projection with the
    /// window column in Oracle, so it is rejected before execution.
    fn build_page_query(
        &self,
        skip: u64,
        take: u64,
        page: &SqlPageStatement,
        parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        if page.has_unaliased_star() {
            return Err(Error::configuration(
                "oracle",
                "paged queries must alias their projection; use `t.*` instead of `*`"
            ));
        }
        row_number_page(skip, take, page, parameters, "ORDER BY NULL")
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        let Some(primary_key) = primary_key else {
            return Ok(IdentityCapture::plain(insert));
        };
        Ok(IdentityCapture {
            sql:  format!(
                "{} RETURNING {} INTO :{IDENTITY_OUTPUT}",
                insert.to_sql(),
                self.escape_identifier(primary_key)?
            ),
            read: IdentityRead::OutParameter(IDENTITY_OUTPUT.to_string())
        })
    }

    fn pre_execute(&self, statement: &mut Statement) {
        statement.set_bind_by_name(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_upper_cases() {
        assert_eq!(OracleDialect.escape_identifier("Widget").unwrap(), "\"WIDGET\"");
        assert_eq!(OracleDialect.escape_identifier("\"Mixed\"").unwrap(), "\"Mixed\"");
        let once = OracleDialect.escape_identifier("name").unwrap();
        assert_eq!(OracleDialect.escape_identifier(&once).unwrap(), once);
    }

    #[test]
    fn colon_parameters() {
        let info = ConnectionInfo::default();
        assert_eq!(OracleDialect.placeholder("p3", 4, &info), ":p3");
    }

    #[test]
    fn unaliased_star_rejected() {
        let info = ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&OracleDialect, &info);
        let page = SqlPageStatement::parse("SELECT * FROM \"WIDGET\" ORDER BY \"ID\"");
        let err = OracleDialect.build_page_query(0, 10, &page, &mut writer).unwrap_err();
        assert!(err.is_configuration());
        assert!(writer.is_empty());
    }

    #[test]
    fn aliased_star_pages() {
        let info = ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&OracleDialect, &info);
        let page = SqlPageStatement::parse("SELECT w.* FROM \"WIDGET\" w");
        let sql = OracleDialect.build_page_query(10, 10, &page, &mut writer).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY NULL) AS rn, w.* FROM \"WIDGET\" w) page_paged WHERE rn > :p0 AND rn <= :p1"
        );
    }

    #[test]
    fn returning_into_output() {
        let insert = InsertParts {
            table:   "\"WIDGET\"".into(),
            columns: vec!["\"NAME\"".into()],
            values:  vec![":p0".into()]
        };
        let capture = OracleDialect.capture_identity(&insert, Some("Id")).unwrap();
        assert_eq!(
            capture.sql,
            "INSERT INTO \"WIDGET\" (\"NAME\") VALUES (:p0) RETURNING \"ID\" INTO :newid"
        );
        assert_eq!(capture.read, IdentityRead::OutParameter("newid".into()));
    }

    #[test]
    fn binds_by_name() {
        let mut statement = Statement::new("SELECT 1 FROM DUAL");
        OracleDialect.pre_execute(&mut statement);
        assert!(statement.bind_by_name());
    }
}
