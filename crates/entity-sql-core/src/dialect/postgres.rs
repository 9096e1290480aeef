// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! PostgreSQL.
//!
//! Positional `$n` placeholders, `LIMIT`/`OFFSET` paging, `RETURNING`
//! identity capture and `jsonb_to_recordset` bulk loading:
//!
//! ```sql
//! INSERT INTO "public"."Widget" ("Name", "Price")
//! SELECT t."name", t."price"
//! FROM jsonb_to_recordset($1::jsonb) AS t("name" text, "price" double precision)
//! ON CONFLICT ("Id") DO UPDATE SET "Price" = EXCLUDED."Price"
//! RETURNING "Id";
//! ```

use async_trait::async_trait;

use super::{DatabaseDialect, DialectStrategy, IdentityCapture, InsertParts};
use crate::{
    command::{ParameterSource, ParameterWriter},
    config::ConnectionInfo,
    error::{Error, Result},
    metadata::{EntityAttributeDefinition, ValueType},
    structured::{JSON_PAYLOAD, JsonInsertPlan, ResolvedConflict},
    value::Value
};

/// PostgreSQL strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlDialect;

impl PostgreSqlDialect {
    fn column_list(&self, attributes: &[&EntityAttributeDefinition]) -> Result<String> {
        Ok(attributes
            .iter()
            .map(|a| self.escape_identifier(a.physical_name()))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }
}

#[async_trait]
impl DialectStrategy for PostgreSqlDialect {
    fn kind(&self) -> DatabaseDialect {
        DatabaseDialect::PostgreSql
    }

    fn quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn placeholder(&self, _name: &str, position: usize, _connection: &ConnectionInfo) -> String {
        format!("${position}")
    }

    fn capture_identity(&self, insert: &InsertParts, primary_key: Option<&str>) -> Result<IdentityCapture> {
        let Some(primary_key) = primary_key else {
            return Ok(IdentityCapture::plain(insert));
        };
        Ok(IdentityCapture::scalar(format!(
            "{} RETURNING {} AS NewID",
            insert.to_sql(),
            self.escape_identifier(primary_key)?
        )))
    }

    fn map_parameter_value(&self, value: Value) -> Value {
        value
    }

    fn recordset_type_name(&self, value_type: ValueType) -> Result<&'static str> {
        Ok(match value_type {
            ValueType::Boolean => "boolean",
            ValueType::Int16 => "smallint",
            ValueType::Int32 => "integer",
            ValueType::Int64 | ValueType::UInt32 => "bigint",
            ValueType::UInt64 => "numeric(20,0)",
            ValueType::Float32 => "real",
            ValueType::Float64 => "double precision",
            ValueType::Decimal => "numeric",
            ValueType::String => "text",
            ValueType::Uuid => "uuid",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::Timestamp => "timestamp",
            ValueType::TimestampTz => "timestamptz",
            ValueType::Json => "jsonb",
            ValueType::Bytes => {
                return Err(Error::TypeMapping {
                    value_type,
                    dialect: self.kind()
                });
            }
        })
    }

    fn render_json_insert(
        &self,
        plan: &JsonInsertPlan<'_>,
        parameters: &mut ParameterWriter<'_>
    ) -> Result<String> {
        let payload = parameters.push(ParameterSource::Attribute(JSON_PAYLOAD.to_string()));

        let targets: Vec<_> = plan.pairs().iter().map(|p| p.target).collect();
        let sources = plan
            .pairs()
            .iter()
            .map(|p| Ok(format!("t.{}", self.escape_identifier(p.source.property_name())?)))
            .collect::<Result<Vec<_>>>()?;
        let mut recordset = Vec::new();
        for source in plan.sources() {
            recordset.push(format!(
                "{} {}",
                self.escape_identifier(source.property_name())?,
                self.recordset_type_name(source.value_type())?
            ));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) SELECT {} FROM jsonb_to_recordset({payload}::jsonb) AS t({})",
            plan.table(),
            self.column_list(&targets)?,
            sources.join(", "),
            recordset.join(", ")
        );

        match plan.conflict() {
            ResolvedConflict::Raise => {}
            ResolvedConflict::DoNothing {
                ..
            } => sql.push_str(" ON CONFLICT DO NOTHING"),
            ResolvedConflict::Update {
                hints,
                targets
            } if targets.is_empty() => {
                sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", self.column_list(hints)?));
            }
            ResolvedConflict::Update {
                hints,
                targets
            } => {
                let set = targets
                    .iter()
                    .map(|a| {
                        let column = self.escape_identifier(a.physical_name())?;
                        Ok(format!("{column} = EXCLUDED.{column}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                sql.push_str(&format!(
                    " ON CONFLICT ({}) DO UPDATE SET {}",
                    self.column_list(hints)?,
                    set.join(", ")
                ));
            }
        }

        if !plan.returning().is_empty() {
            sql.push_str(&format!(" RETURNING {}", self.column_list(plan.returning())?));
        }
        sql.push(';');
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityRead, paging::SqlPageStatement};

    #[test]
    fn positional_placeholders() {
        let info = ConnectionInfo::default();
        assert_eq!(PostgreSqlDialect.placeholder("p0", 1, &info), "$1");
        assert_eq!(PostgreSqlDialect.placeholder("p9", 10, &info), "$10");
    }

    #[test]
    fn limit_offset_paging() {
        let info = ConnectionInfo::default();
        let mut writer = ParameterWriter::new(&PostgreSqlDialect, &info);
        writer.push_value(1_i64);
        let page = SqlPageStatement::parse("SELECT t0.\"Id\" FROM \"T\" t0 WHERE t0.\"Id\" > $1 ORDER BY t0.\"Id\"");
        let sql = PostgreSqlDialect.build_page_query(40, 20, &page, &mut writer).unwrap();
        assert_eq!(
            sql,
            "SELECT t0.\"Id\" FROM \"T\" t0 WHERE t0.\"Id\" > $1 ORDER BY t0.\"Id\" LIMIT $2 OFFSET $3"
        );
        let slots = writer.into_slots();
        assert_eq!(slots[1].source(), &ParameterSource::Fixed(Value::I64(20)));
        assert_eq!(slots[2].source(), &ParameterSource::Fixed(Value::I64(40)));
    }

    #[test]
    fn returning_new_id() {
        let insert = InsertParts {
            table:   "\"Widget\"".into(),
            columns: vec!["\"Name\"".into()],
            values:  vec!["$1".into()]
        };
        let capture = PostgreSqlDialect.capture_identity(&insert, Some("Id")).unwrap();
        assert_eq!(
            capture.sql,
            "INSERT INTO \"Widget\" (\"Name\") VALUES ($1) RETURNING \"Id\" AS NewID"
        );
        assert_eq!(capture.read, IdentityRead::Scalar);
        assert_eq!(
            PostgreSqlDialect.capture_identity(&insert, None).unwrap().read,
            IdentityRead::None
        );
    }

    #[test]
    fn booleans_pass_through() {
        assert_eq!(PostgreSqlDialect.map_parameter_value(Value::Bool(true)), Value::Bool(true));
    }

    #[test]
    fn exists_is_standard() {
        assert_eq!(
            PostgreSqlDialect.exists_sql("\"T\"", "\"Id\" = $1"),
            "SELECT EXISTS(SELECT 1 FROM \"T\" WHERE \"Id\" = $1)"
        );
    }

    #[test]
    fn recordset_types() {
        assert_eq!(PostgreSqlDialect.recordset_type_name(ValueType::Float64).unwrap(), "double precision");
        assert_eq!(PostgreSqlDialect.recordset_type_name(ValueType::UInt64).unwrap(), "numeric(20,0)");
        let err = PostgreSqlDialect.recordset_type_name(ValueType::Bytes).unwrap_err();
        assert_eq!(err.to_string(), "value type `Bytes` has no postgres representation");
    }
}
