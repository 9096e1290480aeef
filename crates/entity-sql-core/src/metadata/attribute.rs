// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Mapped column metadata.

use super::ValueType;

/// Behavioural flags of a mapped attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeFlags {
    /// Part of the primary key.
    pub primary_key: bool,
    /// Value generated by the database on insert (row identity).
    pub identity:    bool,
    /// Written by INSERT statements.
    pub insertable:  bool,
    /// Written by UPDATE statements.
    pub updatable:   bool,
    /// Accepts `NULL`.
    pub nullable:    bool,
    /// Optimistic concurrency revision counter.
    pub revision:    bool
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self {
            primary_key: false,
            identity:    false,
            insertable:  true,
            updatable:   true,
            nullable:    false,
            revision:    false
        }
    }
}

/// One mapped column of an entity.
///
/// Immutable once built; owned by an
/// [`EntityDefinition`](super::EntityDefinition).
///
/// # Example
///
/// ```rust
/// use entity_sql_core::metadata::{EntityAttributeDefinition, ValueType};
///
/// let id = EntityAttributeDefinition::new("Id", "id", 0, ValueType::Int64)
///     .primary_key()
///     .identity();
/// assert!(id.is_identity());
/// assert!(!id.is_insertable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAttributeDefinition {
    physical_name: String,
    property_name: String,
    ordinal:       usize,
    value_type:    ValueType,
    flags:         AttributeFlags
}

impl EntityAttributeDefinition {
    /// Create an insertable, updatable, non-key attribute.
    pub fn new(
        physical_name: impl Into<String>,
        property_name: impl Into<String>,
        ordinal: usize,
        value_type: ValueType
    ) -> Self {
        Self {
            physical_name: physical_name.into(),
            property_name: property_name.into(),
            ordinal,
            value_type,
            flags: AttributeFlags::default()
        }
    }

    /// Mark as part of the primary key. Key columns are never updated.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.flags.primary_key = true;
        self.flags.updatable = false;
        self
    }

    /// Mark as database-generated row identity.
    #[must_use]
    pub fn identity(mut self) -> Self {
        self.flags.identity = true;
        self.flags.insertable = false;
        self.flags.updatable = false;
        self
    }

    /// Mark as read-only (never written).
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.flags.insertable = false;
        self.flags.updatable = false;
        self
    }

    /// Mark as written on insert only.
    #[must_use]
    pub fn insert_only(mut self) -> Self {
        self.flags.updatable = false;
        self
    }

    /// Set nullability.
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.flags.nullable = nullable;
        self
    }

    /// Mark as optimistic concurrency revision.
    #[must_use]
    pub fn revision(mut self) -> Self {
        self.flags.revision = true;
        self
    }

    /// Column name in the database.
    #[must_use]
    pub fn physical_name(&self) -> &str {
        &self.physical_name
    }

    /// Property name on the mapped type.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Declaration position, unique within the entity.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Value type tag.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// All flags.
    #[must_use]
    pub const fn flags(&self) -> AttributeFlags {
        self.flags
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.flags.primary_key
    }

    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.flags.identity
    }

    #[must_use]
    pub const fn is_insertable(&self) -> bool {
        self.flags.insertable && !self.flags.identity
    }

    #[must_use]
    pub const fn is_updatable(&self) -> bool {
        self.flags.updatable && !self.flags.primary_key && !self.flags.identity
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.flags.nullable
    }

    #[must_use]
    pub const fn is_revision(&self) -> bool {
        self.flags.revision
    }

    /// Check whether `name` refers to this attribute by property or column
    /// name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.property_name == name || self.physical_name == name
    }
}
