// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # entity-sql
//!
//! One crate, all features. Re-exports:
//! - [`Entity`](macro@Entity) derive macro from `entity-sql-derive`
//! - All types from `entity-sql-core` ([`StatementCompiler`],
//!   [`Repository`], [`JsonInsert`], the dialects and metadata)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use entity_sql::{DatabaseDialect, DefinitionRegistry, Entity, Filter, RepositoryProvider};
//!
//! #[derive(Debug, Clone, Entity)]
//! #[entity(table = "Widget", rename_all = "PascalCase")]
//! pub struct Widget {
//!     #[id]
//!     #[identity]
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! let provider = RepositoryProvider::new(
//!     DatabaseDialect::Sqlite,
//!     ConnectionInfo::parse("Data Source=app.db"),
//!     Arc::new(DefinitionRegistry::new())
//! );
//! let mut widgets = provider.repository::<Widget, _>(&mut conn)?;
//! let id = widgets.insert(&widget).await?;
//! let bolts = widgets.find(Filter::like("name", "bolt%")).await?;
//! ```

pub use entity_sql_core::*;
pub use entity_sql_derive::Entity;
