// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Firebird.

use async_trait::async_trait;

use super::{DatabaseDialect, DialectStrategy, IdentityCapture, InsertParts, offset_fetch_page};
use crate::{command::ParameterWriter, error::Result, paging::SqlPageStatement};

/// Firebird strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirebirdDialect;

#[async_trait]
impl DialectStrategy for FirebirdDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::Firebird
    }

    fn quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn exists_sql(&self, table: &str, predicate: &str) -> String {
        format!(
            "SELECT CASE WHEN EXISTS(SELECT 1 FROM {table} WHERE {predicate}) THEN 1 ELSE 0 END FROM RDB$DATABASE"
        )
    }

    fn build_page_query(
        &self,
        skip: u64,
        take: u64,
        page: &SqlPageStatement,
        parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        offset_fetch_page(skip, take, page, parameters, None)
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        let Some(primary_key) = primary_key else {
            return Ok(IdentityCapture::plain(insert));
        };
        Ok(IdentityCapture::scalar(format!(
            "{} RETURNING {}",
            insert.to_sql(),
            self.escape_identifier(primary_key)?
        )))
    }
}
