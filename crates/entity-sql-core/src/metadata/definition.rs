// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Mapped table metadata.
//!
//! An [`EntityDefinition`] is built once per mapped type through
//! [`EntityDefinitionBuilder`], validated, and then shared read-only.
//!
//! # Invariants
//!
//! - attribute ordinals are unique
//! - at most one attribute is a row identity
//! - at least one attribute is part of the primary key, except in shapes
//!   from [`EntityDefinitionBuilder::build_shape`]
//! - at most one attribute is a revision counter
//!
//! Attributes are always stored ordered by ordinal, so every consumer sees
//! the same deterministic column order.

use std::collections::HashSet;

use super::EntityAttributeDefinition;
use crate::error::{Error, Result, require_non_blank};

/// One mapped table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDefinition {
    container:    String,
    entity:       String,
    attributes:   Vec<EntityAttributeDefinition>,
    identity:     Option<usize>,
    primary_keys: Vec<usize>,
    revision:     Option<usize>
}

impl EntityDefinition {
    /// Start building a definition for `container.entity`.
    ///
    /// An empty container means the connection's default schema.
    pub fn builder(container: impl Into<String>, entity: impl Into<String>) -> EntityDefinitionBuilder {
        EntityDefinitionBuilder {
            container:  container.into(),
            entity:     entity.into(),
            attributes: Vec::new()
        }
    }

    /// Schema name; empty when unqualified.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Table name.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Attributes ordered by ordinal.
    #[must_use]
    pub fn attributes(&self) -> &[EntityAttributeDefinition] {
        &self.attributes
    }

    /// The row identity attribute, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&EntityAttributeDefinition> {
        self.identity.map(|i| &self.attributes[i])
    }

    /// The revision attribute, if any.
    #[must_use]
    pub fn revision(&self) -> Option<&EntityAttributeDefinition> {
        self.revision.map(|i| &self.attributes[i])
    }

    /// Primary key attributes in ordinal order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &EntityAttributeDefinition> {
        self.primary_keys.iter().map(|&i| &self.attributes[i])
    }

    /// Attributes written by INSERT, ordinal order.
    pub fn insertable(&self) -> impl Iterator<Item = &EntityAttributeDefinition> {
        self.attributes.iter().filter(|a| a.is_insertable())
    }

    /// Attributes written by UPDATE (excluding revision), ordinal order.
    pub fn updatable(&self) -> impl Iterator<Item = &EntityAttributeDefinition> {
        self.attributes
            .iter()
            .filter(|a| a.is_updatable() && !a.is_revision())
    }

    /// Find an attribute by property or column name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&EntityAttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.property_name() == name)
            .or_else(|| self.attributes.iter().find(|a| a.physical_name() == name))
    }

    /// Like [`find`](Self::find) but failing with
    /// [`Error::UnknownAttribute`].
    pub fn require(&self, name: &str) -> Result<&EntityAttributeDefinition> {
        self.find(name).ok_or_else(|| Error::UnknownAttribute {
            entity:    self.qualified_name(),
            attribute: name.to_string()
        })
    }

    /// `container.entity`, or just `entity` when unqualified.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.container.is_empty() {
            self.entity.clone()
        } else {
            format!("{}.{}", self.container, self.entity)
        }
    }
}

/// Builder validating [`EntityDefinition`] invariants.
#[derive(Debug)]
pub struct EntityDefinitionBuilder {
    container:  String,
    entity:     String,
    attributes: Vec<EntityAttributeDefinition>
}

impl EntityDefinitionBuilder {
    /// Add an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: EntityAttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// - blank entity name or attribute names
    /// - duplicate ordinals
    /// - more than one identity or revision attribute
    /// - no primary key
    pub fn build(self) -> Result<EntityDefinition> {
        self.finish(true)
    }

    /// Validate and build a row shape that is never queried as a table,
    /// such as the item type of a structured insert. A primary key is not
    /// required.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build), except for the primary key rule.
    pub fn build_shape(self) -> Result<EntityDefinition> {
        self.finish(false)
    }

    fn finish(mut self, keyed: bool) -> Result<EntityDefinition> {
        require_non_blank("entity", &self.entity)?;
        let name = if self.container.is_empty() {
            self.entity.clone()
        } else {
            format!("{}.{}", self.container, self.entity)
        };

        let mut ordinals = HashSet::new();
        for attr in &self.attributes {
            require_non_blank("physical_name", attr.physical_name())?;
            require_non_blank("property_name", attr.property_name())?;
            if !ordinals.insert(attr.ordinal()) {
                return Err(Error::configuration(
                    name,
                    format!("ordinal {} is used by more than one attribute", attr.ordinal())
                ));
            }
        }

        self.attributes.sort_by_key(EntityAttributeDefinition::ordinal);

        let identities: Vec<usize> = positions(&self.attributes, |a| a.is_identity());
        if identities.len() > 1 {
            return Err(Error::configuration(
                name,
                "at most one attribute may be a row identity"
            ));
        }

        let revisions: Vec<usize> = positions(&self.attributes, |a| a.is_revision());
        if revisions.len() > 1 {
            return Err(Error::configuration(
                name,
                "at most one attribute may be a revision"
            ));
        }

        let primary_keys = positions(&self.attributes, |a| a.is_primary_key());
        if keyed && primary_keys.is_empty() {
            return Err(Error::configuration(name, "no primary key attribute"));
        }

        Ok(EntityDefinition {
            container: self.container,
            entity: self.entity,
            attributes: self.attributes,
            identity: identities.first().copied(),
            primary_keys,
            revision: revisions.first().copied()
        })
    }
}

fn positions(
    attributes: &[EntityAttributeDefinition],
    predicate: impl Fn(&EntityAttributeDefinition) -> bool
) -> Vec<usize> {
    attributes
        .iter()
        .enumerate()
        .filter(|(_, a)| predicate(a))
        .map(|(i, _)| i)
        .collect()
}
