// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Join edges between entity definitions.
//!
//! A [`RelationSet`] is an ordered list of [`EntityRelation`]s rooted at a
//! primary entity. Declaration order is join order: each relation's source
//! must already be part of the graph when the relation is declared, which
//! in practice makes the set a tree rooted at the primary entity.
//!
//! ```text
//! Order (t0) ──inner──► Customer (t1)
//!     │
//!     └──────left──► Shipment (t2)
//! ```

use std::sync::Arc;

use super::EntityDefinition;
use crate::error::{Error, Result};

/// Join kind of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// `INNER JOIN`.
    #[default]
    Inner,
    /// `LEFT JOIN`.
    Left
}

impl JoinKind {
    /// SQL keyword.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN"
        }
    }
}

/// Directed join edge `source.source_attribute = target.target_attribute`.
#[derive(Debug, Clone)]
pub struct EntityRelation {
    source:           Arc<EntityDefinition>,
    source_attribute: String,
    target:           Arc<EntityDefinition>,
    target_attribute: String,
    kind:             JoinKind
}

impl EntityRelation {
    /// Create a relation, validating both attribute names.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] when either side does not define the
    /// named attribute.
    pub fn new(
        source: Arc<EntityDefinition>,
        source_attribute: &str,
        target: Arc<EntityDefinition>,
        target_attribute: &str,
        kind: JoinKind
    ) -> Result<Self> {
        let source_attribute = source.require(source_attribute)?.property_name().to_string();
        let target_attribute = target.require(target_attribute)?.property_name().to_string();
        Ok(Self {
            source,
            source_attribute,
            target,
            target_attribute,
            kind
        })
    }

    #[must_use]
    pub fn source(&self) -> &Arc<EntityDefinition> {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &Arc<EntityDefinition> {
        &self.target
    }

    /// Property name on the source entity.
    #[must_use]
    pub fn source_attribute(&self) -> &str {
        &self.source_attribute
    }

    /// Property name on the target entity.
    #[must_use]
    pub fn target_attribute(&self) -> &str {
        &self.target_attribute
    }

    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }
}

/// Ordered relation graph rooted at a primary entity.
#[derive(Debug, Clone)]
pub struct RelationSet {
    root:      Arc<EntityDefinition>,
    relations: Vec<EntityRelation>
}

impl RelationSet {
    /// Create an empty set rooted at `root`.
    pub fn new(root: Arc<EntityDefinition>) -> Self {
        Self {
            root,
            relations: Vec::new()
        }
    }

    /// Append a relation.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the relation's source is neither the
    /// root nor the target of an earlier relation.
    pub fn join(mut self, relation: EntityRelation) -> Result<Self> {
        let reachable = Arc::ptr_eq(relation.source(), &self.root)
            || *relation.source() == self.root
            || self
                .relations
                .iter()
                .any(|r| r.target() == relation.source());
        if !reachable {
            return Err(Error::configuration(
                self.root.qualified_name(),
                format!(
                    "relation source `{}` is not joined before it is used",
                    relation.source().qualified_name()
                )
            ));
        }
        self.relations.push(relation);
        Ok(self)
    }

    /// Convenience wrapper around [`EntityRelation::new`] + [`join`](Self::join).
    pub fn join_on(
        self,
        source: &Arc<EntityDefinition>,
        source_attribute: &str,
        target: &Arc<EntityDefinition>,
        target_attribute: &str,
        kind: JoinKind
    ) -> Result<Self> {
        let relation = EntityRelation::new(
            Arc::clone(source),
            source_attribute,
            Arc::clone(target),
            target_attribute,
            kind
        )?;
        self.join(relation)
    }

    /// Primary entity.
    #[must_use]
    pub fn root(&self) -> &Arc<EntityDefinition> {
        &self.root
    }

    /// Relations in declaration order.
    #[must_use]
    pub fn relations(&self) -> &[EntityRelation] {
        &self.relations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityAttributeDefinition, ValueType};

    fn table(name: &str, extra: &str) -> Arc<EntityDefinition> {
        Arc::new(
            EntityDefinition::builder("sales", name)
                .attribute(EntityAttributeDefinition::new("Id", "id", 0, ValueType::Int64).primary_key())
                .attribute(EntityAttributeDefinition::new(extra, extra.to_lowercase(), 1, ValueType::Int64))
                .build()
                .unwrap()
        )
    }

    #[test]
    fn join_requires_reachable_source() {
        let order = table("Order", "CustomerId");
        let customer = table("Customer", "RegionId");
        let region = table("Region", "Code");

        let err = RelationSet::new(Arc::clone(&order))
            .join_on(&customer, "RegionId", &region, "Id", JoinKind::Inner)
            .unwrap_err();
        assert!(err.is_configuration());

        let set = RelationSet::new(Arc::clone(&order))
            .join_on(&order, "CustomerId", &customer, "Id", JoinKind::Inner)
            .unwrap()
            .join_on(&customer, "RegionId", &region, "Id", JoinKind::Left)
            .unwrap();
        assert_eq!(set.relations().len(), 2);
        assert_eq!(set.relations()[1].kind(), JoinKind::Left);
    }

    #[test]
    fn unknown_attribute_rejected() {
        let order = table("Order", "CustomerId");
        let customer = table("Customer", "RegionId");
        let err =
            EntityRelation::new(order, "Nope", customer, "Id", JoinKind::Inner).unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));
    }

    #[test]
    fn join_kind_sql() {
        assert_eq!(JoinKind::Inner.as_sql(), "INNER JOIN");
        assert_eq!(JoinKind::Left.as_sql(), "LEFT JOIN");
    }
}
