// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Cancellation of in-flight operations.
//!
//! Dropping a repository future already aborts it. [`cancellable`] adds an
//! explicit signal: whichever of the operation and the signal completes
//! first wins. A cancelled operation leaves the connection in an unknown
//! state; discard it (or roll back the transaction) afterwards.

use std::{future::Future, pin::pin};

use futures::future::{Either, select};
use tracing::debug;

use crate::error::{Error, Result};

/// Race `operation` against `signal`.
///
/// # Errors
///
/// [`Error::Cancelled`] when `signal` completes first, otherwise whatever
/// the operation returns.
///
/// ```rust
/// use entity_sql_core::{cancel::cancellable, Error};
/// use futures::{executor::block_on, future};
///
/// let result: Result<i32, Error> = block_on(cancellable(future::ready(()), future::pending()));
/// assert!(result.unwrap_err().is_cancelled());
/// ```
pub async fn cancellable<T, S, F>(signal: S, operation: F) -> Result<T>
where
    S: Future<Output = ()>,
    F: Future<Output = Result<T>>
{
    let operation = pin!(operation);
    let signal = pin!(signal);
    match select(operation, signal).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            debug!("operation cancelled by signal");
            Err(Error::Cancelled)
        }
    }
}
