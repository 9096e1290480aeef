// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

//! Derive macro registering entity metadata with entity-sql.
//!
//! Use it through the `entity-sql` crate, which re-exports the macro next to
//! the runtime types the generated code refers to.
//!
//! # Attribute Quick Reference
//!
//! ```rust,ignore
//! #[derive(Entity)]
//! #[entity(table = "Widget", schema = "dbo", rename_all = "PascalCase")]
//! pub struct Widget {
//!     #[id]
//!     #[identity]
//!     pub id: i64,                  // column "Id", generated on insert
//!
//!     pub name: String,             // column "Name"
//!
//!     #[column(name = "qty")]
//!     pub quantity: i32,            // column "qty"
//!
//!     #[column(readonly)]
//!     pub created: NaiveDateTime,   // never written
//!
//!     #[revision]
//!     pub row_version: i64,         // optimistic concurrency counter
//!
//!     #[column(skip)]
//!     pub cache: Option<String>     // not mapped, Default on read
//! }
//! ```

mod entity;

use proc_macro::TokenStream;

/// Derive `Entity` and `FromRow` for a struct with named fields.
///
/// # Entity Attributes
///
/// | Attribute | Required | Default | Description |
/// |-----------|----------|---------|-------------|
/// | `table` | No | struct name | Table name |
/// | `schema` | No | none | Schema (container) name |
/// | `rename_all` | No | none | Column naming rule for fields without `name` |
///
/// `rename_all` accepts `"PascalCase"`, `"camelCase"`, `"snake_case"`,
/// `"SCREAMING_SNAKE_CASE"`, `"kebab-case"`, `"lowercase"` and
/// `"UPPERCASE"`.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[id]` | Part of the primary key. At least one field is required. |
/// | `#[identity]` | Generated by the database on insert. At most one. |
/// | `#[revision]` | Optimistic concurrency counter. |
/// | `#[column(name = "...")]` | Explicit column name. |
/// | `#[column(readonly)]` | Read but never written. |
/// | `#[column(insert_only)]` | Written on insert, never updated. |
/// | `#[column(skip)]` | Not mapped; filled with `Default` when reading rows. |
///
/// Field types must implement `SqlType`, `Into<Value>`, `FromValue` and
/// `Clone`; `Option<T>` marks the column nullable.
///
/// # Generated Code
///
/// - `Entity::describe` building the table metadata
/// - `Entity::value` reading a property by name
/// - `FromRow` reading each mapped property from a row
#[proc_macro_derive(Entity, attributes(entity, id, identity, revision, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive(input)
}
