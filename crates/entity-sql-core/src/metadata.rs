// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity metadata model.
//!
//! ```text
//! metadata.rs (coordinator)
//! ├── value_type.rs - ValueType tags and the SqlType bridge
//! ├── attribute.rs  - EntityAttributeDefinition (one column)
//! ├── definition.rs - EntityDefinition (one table) + builder
//! ├── relation.rs   - EntityRelation / RelationSet (join graph)
//! └── registry.rs   - DefinitionRegistry (process-lifetime cache)
//! ```
//!
//! Everything here is immutable once built. How the metadata was obtained
//! (derive macro or hand-written builder calls) is invisible to the
//! compiler.

mod attribute;
mod definition;
mod registry;
mod relation;
mod value_type;

pub use attribute::{AttributeFlags, EntityAttributeDefinition};
pub use definition::{EntityDefinition, EntityDefinitionBuilder};
pub use registry::DefinitionRegistry;
pub use relation::{EntityRelation, JoinKind, RelationSet};
pub use value_type::{SqlType, ValueType};
