// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Externally supplied transactions.
//!
//! The engine never begins transactions on its own. A caller begins one
//! through [`Transactional`], hands it to a [`Repository`](crate::Repository)
//! (transactions implement [`Connection`]) and finishes it with
//! [`TransactionOps`]. [`run_in_transaction`] packages that sequence:
//!
//! ```text
//! begin ──► operation(&mut tx) ──Ok──► commit
//!                    │
//!                    └──Err──► rollback
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let id = run_in_transaction(&mut conn, |tx| Box::pin(async move {
//!     let mut orders = provider.repository::<Order, _>(&mut *tx)?;
//!     let id = orders.insert(&order).await?;
//!     orders.delete_where(&Filter::eq("status", "draft")).await?;
//!     Ok::<_, Error>(id)
//! }))
//! .await?;
//! ```

use std::fmt;

use futures::future::BoxFuture;
use tracing::warn;

use crate::{
    driver::Connection,
    error::{Error, Result}
};

/// Error of a transactional unit of work, tagged with the failing step.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E> {
    #[error("could not begin transaction: {0}")]
    Begin(#[source] E),

    #[error("could not commit transaction: {0}")]
    Commit(#[source] E),

    /// The operation failed and so did the rollback; carries the rollback
    /// error.
    #[error("rollback after a failed operation did not complete: {0}")]
    Rollback(#[source] E),

    /// The operation failed and the transaction was rolled back.
    #[error("unit of work rolled back: {0}")]
    Operation(#[source] E)
}

impl<E> TransactionError<E> {
    pub const fn is_begin(&self) -> bool {
        matches!(self, Self::Begin(_))
    }

    pub const fn is_commit(&self) -> bool {
        matches!(self, Self::Commit(_))
    }

    pub const fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback(_))
    }

    pub const fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// The underlying error, whichever step failed.
    pub fn into_inner(self) -> E {
        match self {
            Self::Begin(e) | Self::Commit(e) | Self::Rollback(e) | Self::Operation(e) => e
        }
    }
}

/// Something a transaction can be begun on.
#[allow(async_fn_in_trait)]
pub trait Transactional: Send {
    /// Active transaction; usable wherever a [`Connection`] is.
    type Transaction<'t>: TransactionOps + Connection
    where
        Self: 't;

    /// Begin a new transaction.
    async fn begin(&mut self) -> Result<Self::Transaction<'_>>;
}

/// Finishing an active transaction.
#[allow(async_fn_in_trait)]
pub trait TransactionOps: Sized + Send {
    /// Commit the transaction.
    async fn commit(self) -> Result<()>;

    /// Rollback the transaction.
    async fn rollback(self) -> Result<()>;
}

/// Run `operation` inside a transaction begun on `source`.
///
/// Commits when the operation returns `Ok`, rolls back when it returns
/// `Err`. When the rollback itself fails the operation error is logged and
/// the rollback error returned.
///
/// # Errors
///
/// [`TransactionError`] tagged with the step that failed.
pub async fn run_in_transaction<'s, S, F, T, E>(source: &'s mut S, operation: F) -> Result<T, TransactionError<E>>
where
    S: Transactional,
    F: for<'c> FnOnce(&'c mut S::Transaction<'s>) -> BoxFuture<'c, Result<T, E>>,
    E: From<Error> + fmt::Display
{
    let mut transaction = source
        .begin()
        .await
        .map_err(|e| TransactionError::Begin(E::from(e)))?;

    match operation(&mut transaction).await {
        Ok(value) => {
            transaction
                .commit()
                .await
                .map_err(|e| TransactionError::Commit(E::from(e)))?;
            Ok(value)
        }
        Err(err) => match transaction.rollback().await {
            Ok(()) => Err(TransactionError::Operation(err)),
            Err(rollback) => {
                warn!(error = %err, "rollback failed after operation error");
                Err(TransactionError::Rollback(E::from(rollback)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        command::Statement,
        driver::ExecuteOutcome,
        value::Row
    };

    #[derive(Default)]
    struct Source {
        journal:       Vec<String>,
        fail_begin:    bool,
        fail_commit:   bool,
        fail_rollback: bool
    }

    struct Tx<'a> {
        source: &'a mut Source
    }

    impl Transactional for Source {
        type Transaction<'t> = Tx<'t>;

        async fn begin(&mut self) -> Result<Tx<'_>> {
            if self.fail_begin {
                return Err(Error::driver(std::io::Error::other("pool closed")));
            }
            self.journal.push("begin".into());
            Ok(Tx {
                source: self
            })
        }
    }

    impl TransactionOps for Tx<'_> {
        async fn commit(self) -> Result<()> {
            if self.source.fail_commit {
                return Err(Error::driver(std::io::Error::other("commit refused")));
            }
            self.source.journal.push("commit".into());
            Ok(())
        }

        async fn rollback(self) -> Result<()> {
            if self.source.fail_rollback {
                return Err(Error::driver(std::io::Error::other("link lost")));
            }
            self.source.journal.push("rollback".into());
            Ok(())
        }
    }

    #[async_trait]
    impl Connection for Tx<'_> {
        async fn execute(&mut self, statement: &Statement) -> Result<ExecuteOutcome> {
            self.source.journal.push(statement.sql().to_string());
            Ok(ExecuteOutcome::new(1))
        }

        async fn query(&mut self, _: &Statement) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn commits_on_ok() {
        let mut source = Source::default();
        let value = run_in_transaction(&mut source, |tx| {
            Box::pin(async move {
                tx.execute(&Statement::new("INSERT")).await?;
                Ok::<_, Error>(5)
            })
        })
        .await
        .unwrap();
        assert_eq!(value, 5);
        assert_eq!(source.journal, ["begin", "INSERT", "commit"]);
    }

    #[tokio::test]
    async fn rolls_back_on_err() {
        let mut source = Source::default();
        let err = run_in_transaction(&mut source, |tx| {
            Box::pin(async move {
                tx.execute(&Statement::new("DELETE")).await?;
                Err::<(), _>(Error::configuration("orders", "nope"))
            })
        })
        .await
        .unwrap_err();
        assert!(err.is_operation());
        assert!(err.into_inner().is_configuration());
        assert_eq!(source.journal, ["begin", "DELETE", "rollback"]);
    }

    #[tokio::test]
    async fn commit_failure_is_tagged() {
        let mut source = Source {
            fail_commit: true,
            ..Source::default()
        };
        let err = run_in_transaction(&mut source, |_| Box::pin(async { Ok::<_, Error>(()) }))
            .await
            .unwrap_err();
        assert!(err.is_commit());
    }

    #[tokio::test]
    async fn rollback_failure_is_tagged() {
        let mut source = Source {
            fail_rollback: true,
            ..Source::default()
        };
        let err = run_in_transaction(&mut source, |_| {
            Box::pin(async { Err::<(), _>(Error::configuration("x", "op")) })
        })
        .await
        .unwrap_err();
        assert!(err.is_rollback());
        assert!(err.into_inner().is_driver());
    }

    #[tokio::test]
    async fn begin_failure_runs_nothing() {
        let mut source = Source {
            fail_begin: true,
            ..Source::default()
        };
        let err = run_in_transaction(&mut source, |_| Box::pin(async { Ok::<_, Error>(()) }))
            .await
            .unwrap_err();
        assert!(err.is_begin());
        assert!(source.journal.is_empty());
    }

    #[test]
    fn errors_name_the_step_and_keep_the_source() {
        use std::error::Error as _;

        let err: TransactionError<Error> = TransactionError::Operation(Error::Cancelled);
        assert_eq!(err.to_string(), "unit of work rolled back: operation cancelled");
        assert!(err.source().is_some_and(|s| s.to_string() == "operation cancelled"));
    }
}
