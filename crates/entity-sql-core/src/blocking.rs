// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Synchronous mirror of [`Repository`].
//!
//! Each call drives the async operation to completion on the calling
//! thread with [`futures::executor::block_on`]. No threads are spawned.
//! Do not call these from inside an async runtime worker.

use futures::executor::block_on;
use serde::Serialize;

use crate::{
    Pagination,
    compiler::SelectQuery,
    driver::Connection,
    entity::Entity,
    error::Result,
    filter::Filter,
    mapper::FromRow,
    repository::Repository,
    structured::JsonInsert,
    value::Value
};

/// Blocking wrapper around a [`Repository`].
#[derive(Debug)]
pub struct BlockingRepository<E, C> {
    inner: Repository<E, C>
}

impl<E: Entity, C: Connection> BlockingRepository<E, C> {
    pub fn new(inner: Repository<E, C>) -> Self {
        Self {
            inner
        }
    }

    /// The async repository.
    pub fn inner_mut(&mut self) -> &mut Repository<E, C> {
        &mut self.inner
    }

    pub fn into_inner(self) -> Repository<E, C> {
        self.inner
    }

    pub fn find_by_key(&mut self, key: impl Into<Value>) -> Result<Option<E>> {
        block_on(self.inner.find_by_key(key))
    }

    pub fn find_by_composite_key(&mut self, keys: &[Value]) -> Result<Option<E>> {
        block_on(self.inner.find_by_composite_key(keys))
    }

    pub fn find_all(&mut self) -> Result<Vec<E>> {
        block_on(self.inner.find_all())
    }

    pub fn find(&mut self, filter: Filter) -> Result<Vec<E>> {
        block_on(self.inner.find(filter))
    }

    pub fn find_query(&mut self, query: &SelectQuery) -> Result<Vec<E>> {
        block_on(self.inner.find_query(query))
    }

    pub fn find_page(&mut self, query: &SelectQuery, pagination: Pagination) -> Result<Vec<E>> {
        block_on(self.inner.find_page(query, pagination))
    }

    pub fn find_joined<P: FromRow>(&mut self, query: &SelectQuery) -> Result<Vec<P>> {
        block_on(self.inner.find_joined(query))
    }

    pub fn exists(&mut self, filter: Option<&Filter>) -> Result<bool> {
        block_on(self.inner.exists(filter))
    }

    pub fn exists_entity(&mut self, entity: &E) -> Result<bool> {
        block_on(self.inner.exists_entity(entity))
    }

    pub fn insert(&mut self, entity: &E) -> Result<Value> {
        block_on(self.inner.insert(entity))
    }

    pub fn insert_many(&mut self, entities: &[E]) -> Result<Vec<Value>> {
        block_on(self.inner.insert_many(entities))
    }

    pub fn insert_json<T: Serialize>(&mut self, builder: &JsonInsert, items: &[T]) -> Result<u64> {
        block_on(self.inner.insert_json(builder, items))
    }

    pub fn insert_json_returning<T, R>(&mut self, builder: &JsonInsert, items: &[T]) -> Result<Vec<R>>
    where
        T: Serialize,
        R: FromRow
    {
        block_on(self.inner.insert_json_returning(builder, items))
    }

    pub fn update(&mut self, entity: &E) -> Result<u64> {
        block_on(self.inner.update(entity))
    }

    pub fn delete(&mut self, entity: &E) -> Result<u64> {
        block_on(self.inner.delete(entity))
    }

    pub fn delete_by_key(&mut self, keys: &[Value]) -> Result<u64> {
        block_on(self.inner.delete_by_key(keys))
    }

    pub fn delete_where(&mut self, filter: &Filter) -> Result<u64> {
        block_on(self.inner.delete_where(filter))
    }
}

impl<E: Entity, C: Connection> From<Repository<E, C>> for BlockingRepository<E, C> {
    fn from(inner: Repository<E, C>) -> Self {
        Self::new(inner)
    }
}
