// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Statement compilation engine for entity-sql.
//!
//! This crate turns declarative entity metadata into dialect-correct SQL
//! and orchestrates its parameterized execution. It is used by code
//! generated with `#[derive(Entity)]` and works equally with hand-written
//! metadata.
//!
//! # Overview
//!
//! ```text
//! metadata ──► qualifier ──► dialect ──► compiler / structured ──► repository
//!   (what)      (quoting)    (engine)      (SQL + slots)          (execute, map)
//! ```
//!
//! - [`metadata`]: entity definitions, attributes, relations, registry
//! - [`dialect`]: one [`DialectStrategy`] per supported engine
//! - [`compiler`]: SELECT/EXISTS/INSERT/UPDATE/DELETE and paging
//! - [`paging`]: ORDER BY and DISTINCT text transforms
//! - [`structured`]: one-round-trip JSON bulk insert/upsert
//! - [`repository`]: CRUD façade over a [`Connection`]
//! - [`transaction`]: externally begun transactions
//! - [`prelude`]: convenient re-exports
//!
//! # Features
//!
//! - `postgres`: [`Connection`] and [`Transactional`] for `sqlx` PostgreSQL

#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod blocking;
pub mod cancel;
pub mod command;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod entity;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod metadata;
pub mod paging;
pub mod prelude;
pub mod provider;
pub mod qualifier;
pub mod repository;
pub mod revision;
pub mod structured;
pub mod transaction;
pub mod value;

/// Re-export async_trait for [`Connection`] implementations.
pub use async_trait::async_trait;
pub use blocking::BlockingRepository;
pub use cancel::cancellable;
pub use command::{
    CompiledCommand, Parameter, ParameterDirection, ParameterSource, ParameterWriter, Statement
};
pub use compiler::{SelectQuery, StatementCompiler};
pub use config::{ConnectionInfo, ProviderConfig};
pub use dialect::{DatabaseDialect, DialectStrategy, IdentityRead, NO_IDENTITY};
pub use driver::{Connection, ExecuteOutcome};
pub use entity::Entity;
pub use error::{BoxDynError, Error, Result};
pub use filter::{Column, Comparison, Filter, OrderBy};
pub use mapper::{FromRow, FromRowMapper, JsonRowMapper, RowMapper};
pub use metadata::{
    DefinitionRegistry, EntityAttributeDefinition, EntityDefinition, EntityRelation, JoinKind,
    RelationSet, SqlType, ValueType
};
pub use provider::{ProviderRegistry, RepositoryProvider};
pub use qualifier::NameQualifier;
pub use repository::Repository;
pub use revision::next_revision;
pub use structured::{ConflictPolicy, JsonInsert};
pub use transaction::{TransactionError, TransactionOps, Transactional, run_in_transaction};
pub use value::{FromValue, Row, Value};

/// Skip/take window for paged queries.
///
/// # Example
///
/// ```rust
/// use entity_sql_core::Pagination;
///
/// let first = Pagination::new(0, 10); // rows 1..=10
/// let third = Pagination::page(2, 25); // rows 51..=75
/// assert_eq!(third.skip, 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of rows to skip.
    pub skip: u64,

    /// Maximum number of rows to return.
    pub take: u64
}

impl Pagination {
    /// Create a window.
    pub const fn new(skip: u64, take: u64) -> Self {
        Self {
            skip,
            take
        }
    }

    /// Window of the zero-based page `page` of `per_page` rows.
    pub const fn page(page: u64, per_page: u64) -> Self {
        Self {
            skip: page.saturating_mul(per_page),
            take: per_page
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            take: 100
        }
    }
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,

    /// Descending order (Z-A, 9-0, newest first).
    Desc
}

impl SortDirection {
    /// Convert to SQL keyword.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_new() {
        let p = Pagination::new(100, 50);
        assert_eq!(p.skip, 100);
        assert_eq!(p.take, 50);
    }

    #[test]
    fn pagination_page() {
        let p = Pagination::page(2, 25);
        assert_eq!(p.take, 25);
        assert_eq!(p.skip, 50);
        assert_eq!(Pagination::page(u64::MAX, 2).skip, u64::MAX);
    }

    #[test]
    fn pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.take, 100);
        assert_eq!(p.skip, 0);
    }

    #[test]
    fn sort_direction_sql() {
        assert_eq!(SortDirection::Asc.as_sql(), "ASC");
        assert_eq!(SortDirection::Desc.as_sql(), "DESC");
    }

    #[test]
    fn sort_direction_default() {
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }
}
