// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The [`Entity`] trait: metadata provider and value accessor of a mapped
//! type.
//!
//! Usually implemented by `#[derive(Entity)]`; hand-written implementations
//! are equally valid since the compiler only sees the resulting
//! [`EntityDefinition`].
//!
//! # Example
//!
//! ```rust
//! use entity_sql_core::{
//!     Entity, EntityAttributeDefinition, EntityDefinition, FromRow, Result, Row, Value, ValueType
//! };
//!
//! struct Tag {
//!     id:   i64,
//!     name: String
//! }
//!
//! impl FromRow for Tag {
//!     fn from_row(row: &Row) -> Result<Self> {
//!         Ok(Self {
//!             id:   row.try_get("id")?,
//!             name: row.try_get("name")?
//!         })
//!     }
//! }
//!
//! impl Entity for Tag {
//!     fn describe() -> Result<EntityDefinition> {
//!         EntityDefinition::builder("", "Tag")
//!             .attribute(EntityAttributeDefinition::new("Id", "id", 0, ValueType::Int64).primary_key())
//!             .attribute(EntityAttributeDefinition::new("Name", "name", 1, ValueType::String))
//!             .build()
//!     }
//!
//!     fn value(&self, property: &str) -> Option<Value> {
//!         match property {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.clone().into()),
//!             _ => None
//!         }
//!     }
//! }
//!
//! assert_eq!(Tag::describe().unwrap().attributes().len(), 2);
//! ```

use crate::{error::Result, mapper::FromRow, metadata::EntityDefinition, value::Value};

/// A type mapped onto one table.
pub trait Entity: FromRow + Send + Sync + 'static {
    /// Build the table metadata.
    ///
    /// Called at most once per process through
    /// [`DefinitionRegistry`](crate::metadata::DefinitionRegistry).
    ///
    /// # Errors
    ///
    /// Invalid metadata (see [`EntityDefinitionBuilder::build`](crate::metadata::EntityDefinitionBuilder::build)).
    fn describe() -> Result<EntityDefinition>;

    /// Current value of a property, `None` for unknown names.
    fn value(&self, property: &str) -> Option<Value>;
}
