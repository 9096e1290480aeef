// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! CRUD façade for one entity type.
//!
//! A [`Repository`] owns (or mutably borrows) a [`Connection`] and
//! orchestrates the rest of the engine: it asks the [`StatementCompiler`]
//! or a [`JsonInsert`] builder for a [`CompiledCommand`], binds entity
//! values into a fresh [`Statement`], executes it, and maps rows back
//! through [`FromRow`] or a [`RowMapper`]. It never assembles SQL itself.
//!
//! ```text
//! Repository::insert(&widget)
//!     │
//!     ├── compiler.insert(definition)      (memoized)
//!     ├── command.bind(dialect, widget)    (fresh Statement)
//!     └── dialect.execute_insert(conn, ..) ──► identity | -1
//! ```
//!
//! Commands that depend only on the definition (key lookups, insert,
//! update, delete) are compiled once per repository. Filtered queries are
//! compiled per call because filter literals are part of the command.

use std::{
    fmt,
    marker::PhantomData,
    sync::{Arc, OnceLock}
};

use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tracing::debug;

use crate::{
    Pagination,
    command::{CompiledCommand, Statement},
    compiler::{SelectQuery, StatementCompiler},
    dialect::DialectStrategy,
    driver::Connection,
    entity::Entity,
    error::{Error, Result},
    filter::Filter,
    mapper::{FromRow, RowMapper},
    metadata::{DefinitionRegistry, EntityDefinition},
    structured::JsonInsert,
    value::{Row, Value}
};

/// Commands compiled at most once per repository.
#[derive(Debug, Default)]
struct Commands {
    find_all:      OnceLock<CompiledCommand>,
    find_by_key:   OnceLock<CompiledCommand>,
    exists_by_key: OnceLock<CompiledCommand>,
    insert:        OnceLock<CompiledCommand>,
    update:        OnceLock<CompiledCommand>,
    delete:        OnceLock<CompiledCommand>
}

/// Compile into `cell` on first use; failures are not cached.
fn memo<F>(cell: &OnceLock<CompiledCommand>, build: F) -> Result<&CompiledCommand>
where
    F: FnOnce() -> Result<CompiledCommand>
{
    if let Some(command) = cell.get() {
        return Ok(command);
    }
    let command = build()?;
    Ok(cell.get_or_init(|| command))
}

/// Whether an existence scalar means "found".
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(other) => other.as_i64().is_some_and(|n| n != 0),
        None => false
    }
}

/// Repository for entity `E` over connection `C`.
///
/// `C` is anything implementing [`Connection`]: an owned connection, a
/// `&mut` borrow of one, or an externally begun transaction.
pub struct Repository<E, C> {
    connection: C,
    compiler:   StatementCompiler,
    definition: Arc<EntityDefinition>,
    commands:   Commands,
    _entity:    PhantomData<fn() -> E>
}

impl<E, C> fmt::Debug for Repository<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &self.definition.qualified_name())
            .field("dialect", &self.compiler.dialect())
            .finish_non_exhaustive()
    }
}

impl<E: Entity, C: Connection> Repository<E, C> {
    /// Repository over an already resolved definition.
    pub fn new(connection: C, compiler: StatementCompiler, definition: Arc<EntityDefinition>) -> Self {
        Self {
            connection,
            compiler,
            definition,
            commands: Commands::default(),
            _entity: PhantomData
        }
    }

    /// Repository whose definition comes from `registry`.
    ///
    /// # Errors
    ///
    /// Invalid metadata reported by [`Entity::describe`].
    pub fn from_registry(connection: C, compiler: StatementCompiler, registry: &DefinitionRegistry) -> Result<Self> {
        Ok(Self::new(connection, compiler, registry.find::<E>()?))
    }

    #[must_use]
    pub fn definition(&self) -> &EntityDefinition {
        &self.definition
    }

    #[must_use]
    pub fn compiler(&self) -> &StatementCompiler {
        &self.compiler
    }

    /// Empty select over this entity, to refine with filters, ordering or
    /// joins.
    #[must_use]
    pub fn select(&self) -> SelectQuery {
        SelectQuery::new(Arc::clone(&self.definition))
    }

    /// The underlying connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Give the connection back.
    pub fn into_inner(self) -> C {
        self.connection
    }

    fn strategy(&self) -> &'static dyn DialectStrategy {
        self.compiler.dialect().strategy()
    }

    fn log(&self, operation: &'static str, statement: &Statement) {
        debug!(
            dialect = %self.compiler.dialect(),
            entity = %self.definition.qualified_name(),
            operation,
            sql = %statement.sql(),
            parameters = statement.parameters().len(),
            "executing statement"
        );
    }

    /// Bind a command whose slots are all fixed values.
    fn bind_fixed(&self, command: &CompiledCommand) -> Result<Statement> {
        command.bind(self.strategy(), |_| None)
    }

    /// Bind primary key slots positionally from `keys`.
    fn bind_keys(&self, command: &CompiledCommand, keys: &[Value]) -> Result<Statement> {
        let expected = self.definition.primary_keys().count();
        if keys.len() != expected {
            return Err(Error::invalid_argument(
                "keys",
                format!("{} key values given, `{}` has {expected}", keys.len(), self.definition.qualified_name())
            ));
        }
        let properties: Vec<&str> = self
            .definition
            .primary_keys()
            .map(|k| k.property_name())
            .collect();
        command.bind(self.strategy(), |property| {
            properties
                .iter()
                .position(|p| *p == property)
                .map(|i| keys[i].clone())
        })
    }

    async fn fetch<T, F>(&mut self, operation: &'static str, statement: Statement, map: F) -> Result<Vec<T>>
    where
        F: Fn(&Row) -> Result<T>
    {
        self.log(operation, &statement);
        let rows = self.connection.query(&statement).await?;
        rows.iter().map(map).collect()
    }

    async fn execute(&mut self, operation: &'static str, statement: Statement) -> Result<u64> {
        self.log(operation, &statement);
        Ok(self.connection.execute(&statement).await?.rows_affected())
    }

    /// Entity with the given single-column primary key.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the key is composite.
    pub async fn find_by_key(&mut self, key: impl Into<Value>) -> Result<Option<E>> {
        self.find_by_composite_key(&[key.into()]).await
    }

    /// Entity with the given primary key values, in key ordinal order.
    pub async fn find_by_composite_key(&mut self, keys: &[Value]) -> Result<Option<E>> {
        let command = memo(&self.commands.find_by_key, || {
            self.compiler.find_by_key(&self.definition)
        })?;
        let statement = self.bind_keys(command, keys)?;
        let found = self.fetch("find_by_key", statement, E::from_row).await?;
        Ok(found.into_iter().next())
    }

    /// Every row of the table.
    pub async fn find_all(&mut self) -> Result<Vec<E>> {
        let command = memo(&self.commands.find_all, || {
            self.compiler
                .select(&SelectQuery::new(Arc::clone(&self.definition)))
        })?;
        let statement = self.bind_fixed(command)?;
        self.fetch("find_all", statement, E::from_row).await
    }

    /// Rows matching `filter`.
    pub async fn find(&mut self, filter: Filter) -> Result<Vec<E>> {
        let query = SelectQuery::new(Arc::clone(&self.definition)).filter(filter);
        self.find_query(&query).await
    }

    /// Rows of an arbitrary select over this entity.
    pub async fn find_query(&mut self, query: &SelectQuery) -> Result<Vec<E>> {
        let statement = self.bind_fixed(&self.compiler.select(query)?)?;
        self.fetch("find", statement, E::from_row).await
    }

    /// One page of `query`.
    ///
    /// # Errors
    ///
    /// Paging errors of the dialect (zero `take`, Oracle `*` projection).
    pub async fn find_page(&mut self, query: &SelectQuery, pagination: Pagination) -> Result<Vec<E>> {
        let select = self.compiler.select(query)?;
        let paged = self.compiler.page(&select, pagination.skip, pagination.take)?;
        let statement = self.bind_fixed(&paged)?;
        self.fetch("find_page", statement, E::from_row).await
    }

    /// Rows of a joined select mapped into a projection type.
    pub async fn find_joined<P: FromRow>(&mut self, query: &SelectQuery) -> Result<Vec<P>> {
        let statement = self.bind_fixed(&self.compiler.select(query)?)?;
        self.fetch("find_joined", statement, P::from_row).await
    }

    /// Rows of `query` mapped by `mapper`.
    pub async fn query_with<T>(&mut self, query: &SelectQuery, mapper: &dyn RowMapper<T>) -> Result<Vec<T>> {
        let statement = self.bind_fixed(&self.compiler.select(query)?)?;
        self.fetch("query", statement, |row| mapper.map(row)).await
    }

    /// Whether any row matches `filter` (any row at all for `None`).
    pub async fn exists(&mut self, filter: Option<&Filter>) -> Result<bool> {
        let statement = self.bind_fixed(&self.compiler.exists(&self.definition, filter)?)?;
        self.log("exists", &statement);
        Ok(is_truthy(self.connection.query_scalar(&statement).await?.as_ref()))
    }

    /// Whether a row with `entity`'s primary key exists.
    pub async fn exists_entity(&mut self, entity: &E) -> Result<bool> {
        let command = memo(&self.commands.exists_by_key, || {
            self.compiler.exists_by_key(&self.definition)
        })?;
        let statement = command.bind(self.strategy(), |p| entity.value(p))?;
        self.log("exists", &statement);
        Ok(is_truthy(self.connection.query_scalar(&statement).await?.as_ref()))
    }

    /// Insert one entity.
    ///
    /// Returns the generated identity, or [`NO_IDENTITY`](crate::dialect::NO_IDENTITY)
    /// as `Value::I64(-1)` when the entity has no row identity.
    pub async fn insert(&mut self, entity: &E) -> Result<Value> {
        let command = memo(&self.commands.insert, || self.compiler.insert(&self.definition))?;
        let statement = command.bind(self.strategy(), |p| entity.value(p))?;
        self.log("insert", &statement);
        let strategy = self.strategy();
        strategy.execute_insert(&mut self.connection, &statement).await
    }

    /// Insert one statement per entity, in order.
    pub async fn insert_many(&mut self, entities: &[E]) -> Result<Vec<Value>> {
        if entities.is_empty() {
            return Err(Error::invalid_argument("entities", "at least one entity is required"));
        }
        let mut identities = Vec::with_capacity(entities.len());
        for entity in entities {
            identities.push(self.insert(entity).await?);
        }
        Ok(identities)
    }

    /// Structured JSON insert builder for this entity.
    #[must_use]
    pub fn json_insert(&self) -> JsonInsert {
        JsonInsert::new(
            Arc::clone(&self.definition),
            self.compiler.dialect(),
            Arc::clone(self.compiler.connection())
        )
    }

    /// Run a structured insert of `items` in one round trip; returns rows
    /// affected.
    pub async fn insert_json<T: Serialize>(&mut self, builder: &JsonInsert, items: &[T]) -> Result<u64> {
        let statement = builder.bind(items)?;
        self.execute("insert_json", statement).await
    }

    /// Run a structured insert and collect its `RETURNING` rows.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the builder returns nothing.
    pub async fn insert_json_returning<T, R>(&mut self, builder: &JsonInsert, items: &[T]) -> Result<Vec<R>>
    where
        T: Serialize,
        R: FromRow
    {
        if !builder.has_returning() {
            return Err(Error::configuration(
                self.definition.qualified_name(),
                "structured insert has no RETURNING columns"
            ));
        }
        let statement = builder.bind(items)?;
        self.fetch("insert_json", statement, R::from_row).await
    }

    /// Stream the rows of a bound statement, mapping each as it arrives.
    ///
    /// Dropping the stream abandons the remaining rows; restart by
    /// executing the statement again.
    pub fn stream<'a, T>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, Result<T>>
    where
        T: FromRow + Send + 'a
    {
        self.log("stream", statement);
        self.connection
            .query_stream(statement)
            .map(|row| row.and_then(|row| T::from_row(&row)))
            .boxed()
    }

    /// Update one entity by primary key.
    ///
    /// # Errors
    ///
    /// [`Error::Concurrency`] when the entity has a revision and no row
    /// matched it.
    pub async fn update(&mut self, entity: &E) -> Result<u64> {
        let command = memo(&self.commands.update, || self.compiler.update(&self.definition))?;
        let statement = command.bind(self.strategy(), |p| entity.value(p))?;
        let affected = self.execute("update", statement).await?;
        if affected == 0
            && let Some(revision) = self.definition.revision()
        {
            let expected = entity
                .value(revision.property_name())
                .and_then(|v| v.as_i64())
                .unwrap_or_default();
            return Err(Error::Concurrency {
                entity: self.definition.qualified_name(),
                expected
            });
        }
        Ok(affected)
    }

    /// Delete one entity by primary key.
    pub async fn delete(&mut self, entity: &E) -> Result<u64> {
        let command = memo(&self.commands.delete, || self.compiler.delete(&self.definition))?;
        let statement = command.bind(self.strategy(), |p| entity.value(p))?;
        self.execute("delete", statement).await
    }

    /// Delete by primary key values, in key ordinal order.
    pub async fn delete_by_key(&mut self, keys: &[Value]) -> Result<u64> {
        let command = memo(&self.commands.delete, || self.compiler.delete(&self.definition))?;
        let statement = self.bind_keys(command, keys)?;
        self.execute("delete", statement).await
    }

    /// Delete every row matching `filter`.
    pub async fn delete_where(&mut self, filter: &Filter) -> Result<u64> {
        let statement = self.bind_fixed(&self.compiler.delete_where(&self.definition, filter)?)?;
        self.execute("delete_where", statement).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(is_truthy(Some(&Value::Bool(true))));
        assert!(is_truthy(Some(&Value::I32(1))));
        assert!(is_truthy(Some(&Value::I64(-3))));
        assert!(!is_truthy(Some(&Value::I64(0))));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(None));
    }

    #[test]
    fn memo_does_not_cache_failures() {
        let cell = OnceLock::new();
        assert!(memo(&cell, || Err(Error::configuration("x", "nope"))).is_err());
        let first = memo(&cell, || Ok(CompiledCommand::new("SELECT 1", Vec::new()))).unwrap();
        assert_eq!(first.sql(), "SELECT 1");
        let again = memo(&cell, || Ok(CompiledCommand::new("SELECT 2", Vec::new()))).unwrap();
        assert_eq!(again.sql(), "SELECT 1");
    }
}
