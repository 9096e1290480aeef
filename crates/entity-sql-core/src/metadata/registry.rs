// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Process-lifetime cache of entity definitions.
//!
//! The registry is an explicitly owned value, created once at startup and
//! shared by `Arc`. Each mapped type is described at most once: the first
//! lookup builds the definition under a write lock, re-checking the map so
//! that concurrent first access still yields a single cached instance.

use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock}
};

use tracing::debug;

use super::EntityDefinition;
use crate::{entity::Entity, error::Result};

/// Cache of [`EntityDefinition`]s keyed by mapped type.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: RwLock<HashMap<TypeId, Arc<EntityDefinition>>>
}

impl DefinitionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition of `E`, describing and caching it on first use.
    ///
    /// # Errors
    ///
    /// Whatever [`Entity::describe`] reports; failures are not cached.
    pub fn find<E: Entity>(&self) -> Result<Arc<EntityDefinition>> {
        let key = TypeId::of::<E>();
        {
            let read = self.definitions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = read.get(&key) {
                return Ok(Arc::clone(found));
            }
        }

        let mut write = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = write.get(&key) {
            return Ok(Arc::clone(found));
        }

        let definition = Arc::new(E::describe()?);
        debug!(
            entity = type_name::<E>(),
            table = %definition.qualified_name(),
            attributes = definition.attributes().len(),
            "entity definition registered"
        );
        write.insert(key, Arc::clone(&definition));
        Ok(definition)
    }

    /// Register a definition explicitly, replacing nothing.
    ///
    /// Returns the cached instance, which is `definition` unless `E` was
    /// already registered.
    pub fn register<E: Entity>(&self, definition: EntityDefinition) -> Arc<EntityDefinition> {
        let mut write = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            write
                .entry(TypeId::of::<E>())
                .or_insert_with(|| Arc::new(definition))
        )
    }

    /// Number of cached definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
