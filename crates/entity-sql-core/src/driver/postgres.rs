// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `sqlx` PostgreSQL driver.
//!
//! Implements [`Connection`] for [`PgConnection`] and PostgreSQL
//! transactions, plus [`Transactional`] for connections and pools.
//! Parameters are bound positionally (`$1`, `$2`, ...) and output slots are
//! skipped since PostgreSQL reads identities through `RETURNING`.
//!
//! PostgreSQL does not coerce a text parameter into a typed column, so
//! `NULL`s are bound with the declared type of their attribute and
//! decimals as `NUMERIC`.

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use rust_decimal::Decimal;
use sqlx::{
    Column as _, PgConnection, PgPool, Postgres, Row as _, TypeInfo as _,
    postgres::{PgArguments, PgRow},
    query::Query
};

use super::{Connection, ExecuteOutcome};
use crate::{
    command::{Parameter, ParameterDirection, Statement},
    error::{Error, Result},
    metadata::ValueType,
    transaction::{TransactionOps, Transactional},
    value::{Row, Value}
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|e| Error::invalid_argument("parameter", format!("`{text}` is not a decimal: {e}")))
}

fn bind_null<'q>(query: PgQuery<'q>, value_type: Option<ValueType>) -> PgQuery<'q> {
    let Some(value_type) = value_type else {
        return query.bind(None::<String>);
    };
    match value_type {
        ValueType::Boolean => query.bind(None::<bool>),
        ValueType::Int16 => query.bind(None::<i16>),
        ValueType::Int32 => query.bind(None::<i32>),
        ValueType::Int64 | ValueType::UInt32 => query.bind(None::<i64>),
        ValueType::UInt64 | ValueType::Decimal => query.bind(None::<Decimal>),
        ValueType::Float32 => query.bind(None::<f32>),
        ValueType::Float64 => query.bind(None::<f64>),
        ValueType::String => query.bind(None::<String>),
        ValueType::Uuid => query.bind(None::<uuid::Uuid>),
        ValueType::Date => query.bind(None::<chrono::NaiveDate>),
        ValueType::Time => query.bind(None::<chrono::NaiveTime>),
        ValueType::Timestamp => query.bind(None::<chrono::NaiveDateTime>),
        ValueType::TimestampTz => query.bind(None::<chrono::DateTime<chrono::Utc>>),
        ValueType::Bytes => query.bind(None::<Vec<u8>>),
        ValueType::Json => query.bind(None::<sqlx::types::Json<serde_json::Value>>)
    }
}

fn bind_value<'q>(query: PgQuery<'q>, parameter: &Parameter) -> Result<PgQuery<'q>> {
    Ok(match parameter.value().clone() {
        Value::Null => bind_null(query, parameter.value_type()),
        Value::Bool(v) => query.bind(v),
        Value::I16(v) => query.bind(v),
        Value::I32(v) => query.bind(v),
        Value::I64(v) => query.bind(v),
        Value::U32(v) => query.bind(i64::from(v)),
        Value::U64(v) => query.bind(
            i64::try_from(v).map_err(|_| Error::invalid_argument("parameter", format!("{v} exceeds BIGINT")))?
        ),
        Value::F32(v) => query.bind(v),
        Value::F64(v) => query.bind(v),
        Value::Decimal(v) => query.bind(decimal(&v)?),
        Value::String(v) => query.bind(v),
        Value::Bytes(v) => query.bind(v),
        Value::Uuid(v) => query.bind(v),
        Value::Date(v) => query.bind(v),
        Value::Time(v) => query.bind(v),
        Value::Timestamp(v) => query.bind(v),
        Value::TimestampTz(v) => query.bind(v),
        Value::Json(v) => query.bind(sqlx::types::Json(v))
    })
}

fn build(statement: &Statement) -> Result<PgQuery<'_>> {
    statement
        .parameters()
        .iter()
        .filter(|p| p.direction() == ParameterDirection::Input)
        .try_fold(sqlx::query(statement.sql()), bind_value)
}

fn column<'r, T>(row: &'r PgRow, index: usize, name: &str) -> Result<Value>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Into<Value>
{
    row.try_get::<Option<T>, _>(index)
        .map(Value::from)
        .map_err(|e| Error::Mapping {
            column:  name.to_string(),
            message: e.to_string()
        })
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let names: Arc<[String]> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut values = Vec::with_capacity(names.len());
    for (index, col) in row.columns().iter().enumerate() {
        let name = col.name();
        let value = match col.type_info().name() {
            "BOOL" => column::<bool>(row, index, name)?,
            "INT2" => column::<i16>(row, index, name)?,
            "INT4" => column::<i32>(row, index, name)?,
            "INT8" => column::<i64>(row, index, name)?,
            "FLOAT4" => column::<f32>(row, index, name)?,
            "FLOAT8" => column::<f64>(row, index, name)?,
            "NUMERIC" => row
                .try_get::<Option<Decimal>, _>(index)
                .map(|v| v.map_or(Value::Null, |d| Value::Decimal(d.to_string())))
                .map_err(|e| Error::Mapping {
                    column:  name.to_string(),
                    message: e.to_string()
                })?,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => column::<String>(row, index, name)?,
            "BYTEA" => column::<Vec<u8>>(row, index, name)?,
            "UUID" => column::<uuid::Uuid>(row, index, name)?,
            "DATE" => column::<chrono::NaiveDate>(row, index, name)?,
            "TIME" => column::<chrono::NaiveTime>(row, index, name)?,
            "TIMESTAMP" => column::<chrono::NaiveDateTime>(row, index, name)?,
            "TIMESTAMPTZ" => column::<chrono::DateTime<chrono::Utc>>(row, index, name)?,
            "JSON" | "JSONB" => column::<serde_json::Value>(row, index, name)?,
            other => {
                return Err(Error::Mapping {
                    column:  name.to_string(),
                    message: format!("unsupported column type {other}; cast it in the query")
                });
            }
        };
        values.push(value);
    }
    Row::new(names, values)
}

#[async_trait]
impl Connection for PgConnection {
    async fn execute(&mut self, statement: &Statement) -> Result<ExecuteOutcome> {
        let done = build(statement)?
            .execute(&mut *self)
            .await
            .map_err(Error::driver)?;
        Ok(ExecuteOutcome::new(done.rows_affected()))
    }

    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        let rows = build(statement)?
            .fetch_all(&mut *self)
            .await
            .map_err(Error::driver)?;
        rows.iter().map(decode_row).collect()
    }

    fn query_stream<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, Result<Row>> {
        match build(statement) {
            Ok(query) => query
                .fetch(self)
                .map(|row| row.map_err(Error::driver).and_then(|row| decode_row(&row)))
                .boxed(),
            Err(err) => stream::iter([Err(err)]).boxed()
        }
    }
}

#[async_trait]
impl Connection for sqlx::Transaction<'_, Postgres> {
    async fn execute(&mut self, statement: &Statement) -> Result<ExecuteOutcome> {
        Connection::execute(&mut **self, statement).await
    }

    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        Connection::query(&mut **self, statement).await
    }

    fn query_stream<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, Result<Row>> {
        Connection::query_stream(&mut **self, statement)
    }
}

impl Transactional for PgConnection {
    type Transaction<'t> = sqlx::Transaction<'t, Postgres>;

    async fn begin(&mut self) -> Result<Self::Transaction<'_>> {
        sqlx::Connection::begin(self).await.map_err(Error::driver)
    }
}

impl Transactional for PgPool {
    type Transaction<'t> = sqlx::Transaction<'static, Postgres>;

    async fn begin(&mut self) -> Result<Self::Transaction<'_>> {
        sqlx::Pool::begin(self).await.map_err(Error::driver)
    }
}

impl TransactionOps for sqlx::Transaction<'_, Postgres> {
    async fn commit(self) -> Result<()> {
        sqlx::Transaction::commit(self).await.map_err(Error::driver)
    }

    async fn rollback(self) -> Result<()> {
        sqlx::Transaction::rollback(self).await.map_err(Error::driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_parse_exactly() {
        assert_eq!(decimal("12.50").unwrap().to_string(), "12.50");
        assert_eq!(decimal(" -0.001 ").unwrap().to_string(), "-0.001");
        assert!(decimal("twelve").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn typed_nulls_and_decimals_bind() {
        let statement = Statement::new("INSERT INTO t (price, amount, note) VALUES ($1, $2, $3)")
            .with_parameter(Parameter::input("p0", Value::Null).with_value_type(Some(ValueType::Float64)))
            .with_parameter(Parameter::input("p1", Value::Decimal("9.99".into())))
            .with_parameter(Parameter::input("p2", Value::Null));
        assert!(build(&statement).is_ok());

        let bad = Statement::new("SELECT $1").with_parameter(Parameter::input("p0", Value::Decimal("x".into())));
        assert!(matches!(build(&bad), Err(err) if err.is_invalid_argument()));
    }
}
