// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Convenient re-exports for common usage.
//!
//! # Usage
//!
//! ```rust
//! use entity_sql_core::prelude::*;
//!
//! let filter = Filter::eq("name", "bolt");
//! assert_eq!(filter.columns().len(), 1);
//! ```

pub use crate::{
    Column, Connection, DatabaseDialect, Entity, EntityDefinition, Error, Filter, FromRow,
    JsonInsert, OrderBy, Pagination, Repository, RepositoryProvider, Result, Row, SelectQuery,
    SortDirection, Statement, StatementCompiler, Value, async_trait
};
