// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Driver boundary.
//!
//! The engine never opens, pools or closes connections. It is handed
//! something implementing [`Connection`] (a plain connection or an
//! externally begun transaction) and only ever calls the four methods
//! below, each with a fully bound [`Statement`].
//!
//! | Method | Used for |
//! |--------|----------|
//! | [`execute`](Connection::execute) | INSERT/UPDATE/DELETE, output parameters |
//! | [`query`](Connection::query) | SELECT into rows |
//! | [`query_scalar`](Connection::query_scalar) | EXISTS, identity reads |
//! | [`query_stream`](Connection::query_stream) | lazily consumed result sets |

#[cfg(feature = "postgres")]
mod postgres;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::{
    command::Statement,
    error::Result,
    value::{Row, Value}
};

/// Result of a non-query execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOutcome {
    rows_affected: u64,
    outputs:       Vec<(String, Value)>
}

impl ExecuteOutcome {
    pub const fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            outputs: Vec::new()
        }
    }

    /// Record an output parameter value.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, value: Value) -> Self {
        self.outputs.push((name.into(), value));
        self
    }

    #[must_use]
    pub const fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Output parameter by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// A database connection or transaction.
///
/// Implementations bind [`Statement::parameters`] in order (or by name when
/// [`Statement::bind_by_name`] is set) and report driver failures as
/// [`Error::Driver`](crate::Error::Driver).
#[async_trait]
pub trait Connection: Send {
    /// Execute without reading rows.
    async fn execute(&mut self, statement: &Statement) -> Result<ExecuteOutcome>;

    /// Execute and collect every row.
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>>;

    /// First column of the first row, if any.
    async fn query_scalar(&mut self, statement: &Statement) -> Result<Option<Value>> {
        let rows = self.query(statement).await?;
        Ok(rows.first().and_then(|row| row.get_index(0)).cloned())
    }

    /// Rows as a stream.
    ///
    /// The default buffers [`query`](Self::query); drivers able to stream
    /// should override it.
    fn query_stream<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, Result<Row>> {
        stream::once(self.query(statement))
            .map(|result| match result {
                Ok(rows) => stream::iter(rows).map(Ok).boxed(),
                Err(err) => stream::iter([Err(err)]).boxed()
            })
            .flatten()
            .boxed()
    }
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for &mut C {
    async fn execute(&mut self, statement: &Statement) -> Result<ExecuteOutcome> {
        (**self).execute(statement).await
    }

    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement).await
    }

    async fn query_scalar(&mut self, statement: &Statement) -> Result<Option<Value>> {
        (**self).query_scalar(statement).await
    }

    fn query_stream<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, Result<Row>> {
        (**self).query_stream(statement)
    }
}
