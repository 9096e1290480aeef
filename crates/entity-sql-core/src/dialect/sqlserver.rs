// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Microsoft SQL Server.

use async_trait::async_trait;

use super::{DatabaseDialect, DialectStrategy, IdentityCapture, InsertParts, row_number_page};
use crate::{
    command::{ParameterSource, ParameterWriter},
    error::{Error, Result},
    metadata::{EntityAttributeDefinition, ValueType},
    paging::SqlPageStatement,
    structured::{JSON_PAYLOAD, JsonInsertPlan, ResolvedConflict}
};

/// SQL Server strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

/// `IF EXISTS` batch shared by the SQL Server family.
pub(super) fn if_exists_sql(table: &str, predicate: &str) -> String {
    format!("IF EXISTS (SELECT 1 FROM {table} WHERE {predicate}) SELECT 1 ELSE SELECT 0")
}

impl SqlServerDialect {
    /// `x.[col] = j.[prop] AND ...` over the conflict columns.
    fn match_predicate(&self, plan: &JsonInsertPlan<'_>, hints: &[&EntityAttributeDefinition]) -> Result<String> {
        let mut terms = Vec::with_capacity(hints.len());
        for hint in hints {
            let source = plan.source_for(hint)?;
            terms.push(format!(
                "x.{} = j.{}",
                self.escape_identifier(hint.physical_name())?,
                self.escape_identifier(source.property_name())?
            ));
        }
        Ok(terms.join(" AND "))
    }
}

#[async_trait]
impl DialectStrategy for SqlServerDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::SqlServer
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
        row_number_page(skip, take, page, parameters, "ORDER BY (SELECT NULL)")
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        let Some(primary_key) = primary_key else {
            return Ok(IdentityCapture::plain(insert));
        };
        let output = format!("OUTPUT INSERTED.{}", self.escape_identifier(primary_key)?);
        Ok(IdentityCapture::scalar(insert.to_sql_with_output(Some(&output))))
    }

    fn recordset_type_name(&self, value_type: ValueType) -> Result<&'static str> {
        Ok(match value_type {
            ValueType::Boolean => "bit",
            ValueType::Int16 => "smallint",
            ValueType::Int32 => "int",
            ValueType::Int64 | ValueType::UInt32 => "bigint",
            ValueType::UInt64 => "decimal(20,0)",
            ValueType::Float32 => "real",
            ValueType::Float64 => "float",
            ValueType::Decimal => "decimal(38,10)",
            ValueType::String => "nvarchar(max)",
            ValueType::Uuid => "uniqueidentifier",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::Timestamp => "datetime2",
            ValueType::TimestampTz => "datetimeoffset",
            ValueType::Json => "nvarchar(max) AS JSON",
            ValueType::Bytes => {
                return Err(Error::TypeMapping {
                    value_type,
                    dialect: self.kind()
                });
            }
        })
    }

    /// `OPENJSON` expansion:
    ///
    /// | Conflict policy | Statement |
    /// |-----------------|-----------|
    /// | raise | `INSERT ... SELECT ... FROM OPENJSON(..) WITH (..) AS j` |
    /// | do nothing | same, filtered by `WHERE NOT EXISTS` on the conflict columns |
    /// | update | `MERGE ... USING OPENJSON(..) ... WHEN MATCHED THEN UPDATE` |
    fn render_json_insert(
        &self,
        plan: &JsonInsertPlan<'_>,
        parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        let payload = parameters.push(ParameterSource::Attribute(JSON_PAYLOAD.to_string()));

        let mut with = Vec::new();
        for source in plan.sources() {
            with.push(format!(
                "{} {} '$.{}'",
                self.escape_identifier(source.property_name())?,
                self.recordset_type_name(source.value_type())?,
                source.property_name()
            ));
        }
        let openjson = format!("OPENJSON({payload}) WITH ({}) AS j", with.join(", "));

        let targets = plan
            .pairs()
            .iter()
            .map(|p| self.escape_identifier(p.target.physical_name()))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let sources = plan
            .pairs()
            .iter()
            .map(|p| Ok(format!("j.{}", self.escape_identifier(p.source.property_name())?)))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let output = if plan.returning().is_empty() {
            String::new()
        } else {
            let columns = plan
                .returning()
                .iter()
                .map(|a| Ok(format!("INSERTED.{}", self.escape_identifier(a.physical_name())?)))
                .collect::<Result<Vec<_>>>()?;
            format!(" OUTPUT {}", columns.join(", "))
        };
        let table = plan.table();

        let conflict = match plan.conflict() {
            ResolvedConflict::Update {
                hints,
                targets
            } if targets.is_empty() => ResolvedConflict::DoNothing {
                hints: hints.clone()
            },
            other => other.clone()
        };

        Ok(match conflict {
            ResolvedConflict::Raise => {
                format!("INSERT INTO {table} ({targets}){output} SELECT {sources} FROM {openjson};")
            }
            ResolvedConflict::DoNothing {
                hints
            } => {
                let predicate = self.match_predicate(plan, &hints)?;
                format!(
                    "INSERT INTO {table} ({targets}){output} SELECT {sources} FROM {openjson} WHERE NOT EXISTS (SELECT 1 FROM {table} AS x WHERE {predicate});"
                )
            }
            ResolvedConflict::Update {
                hints,
                targets: updates
            } => {
                let predicate = self.match_predicate(plan, &hints)?;
                let mut set = Vec::with_capacity(updates.len());
                for target in &updates {
                    let source = plan.source_for(target)?;
                    set.push(format!(
                        "x.{} = j.{}",
                        self.escape_identifier(target.physical_name())?,
                        self.escape_identifier(source.property_name())?
                    ));
                }
                format!(
                    "MERGE INTO {table} AS x USING {openjson} ON {predicate} WHEN MATCHED THEN UPDATE SET {} WHEN NOT MATCHED THEN INSERT ({targets}) VALUES ({sources}){output};",
                    set.join(", ")
                )
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command::ParameterWriter, config::ConnectionInfo, paging::SqlPageStatement};

    #[test]
    fn exists_uses_if_batch() {
        assert_eq!(
            SqlServerDialect.exists_sql("[T]", "[Id] = @p0"),
            "IF EXISTS (SELECT 1 FROM [T] WHERE [Id] = @p0) SELECT 1 ELSE SELECT 0"
        );
    }

    #[test]
    fn row_number_paging_adds_two_parameters() {
        let info = ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&SqlServerDialect, &info);
        writer.push_value(5_i64);
        let page = SqlPageStatement::parse("SELECT t0.[Id] AS [id] FROM [T] t0 WHERE t0.[Id] > @p0 ORDER BY t0.[Id]");
        let sql = SqlServerDialect.build_page_query(20, 10, &page, &mut writer).unwrap();

        assert_eq!(
            sql,
            "SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY t0.[Id]) AS rn, t0.[Id] AS [id] FROM [T] t0 WHERE t0.[Id] > @p0) page_paged WHERE rn > @p1 AND rn <= @p2"
        );
        let slots = writer.into_slots();
        assert_eq!(slots.len(), 3);
        assert_eq!(
            slots[1].source(),
            &ParameterSource::Fixed(crate::value::Value::I64(20))
        );
        assert_eq!(
            slots[2].source(),
            &ParameterSource::Fixed(crate::value::Value::I64(30))
        );
    }

    #[test]
    fn distinct_is_nested_before_windowing() {
        let info = ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&SqlServerDialect, &info);
        let page = SqlPageStatement::parse("SELECT DISTINCT t0.[Name] AS [name] FROM [T] t0 ORDER BY t0.[Name]");
        let sql = SqlServerDialect.build_page_query(0, 5, &page, &mut writer).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY [Name]) AS rn, page_inner.* FROM (SELECT DISTINCT t0.[Name] AS [name] FROM [T] t0) page_inner) page_paged WHERE rn > @p0 AND rn <= @p1"
        );
    }

    #[test]
    fn missing_order_uses_constant_window() {
        let info = ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&SqlServerDialect, &info);
        let page = SqlPageStatement::parse("SELECT a FROM t");
        let sql = SqlServerDialect.build_page_query(0, 1, &page, &mut writer).unwrap();
        assert!(sql.contains("OVER (ORDER BY (SELECT NULL))"));
    }

    #[test]
    fn identity_via_output_clause() {
        let insert = InsertParts {
            table:   "[dbo].[Widget]".into(),
            columns: vec!["[Name]".into()],
            values:  vec!["@p0".into()]
        };
        let capture = SqlServerDialect.capture_identity(&insert, Some("Id")).unwrap();
        assert_eq!(
            capture.sql,
            "INSERT INTO [dbo].[Widget] ([Name]) OUTPUT INSERTED.[Id] VALUES (@p0)"
        );
        assert_eq!(capture.read, super::super::IdentityRead::Scalar);
    }

    #[test]
    fn bytes_have_no_recordset_type() {
        let err = SqlServerDialect.recordset_type_name(ValueType::Bytes).unwrap_err();
        assert!(err.is_type_mapping());
        assert_eq!(SqlServerDialect.recordset_type_name(ValueType::Json).unwrap(), "nvarchar(max) AS JSON");
    }
}
