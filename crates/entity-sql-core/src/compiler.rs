// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Metadata to SQL.
//!
//! [`StatementCompiler`] turns entity definitions, relation graphs and
//! [`Filter`] trees into [`CompiledCommand`]s. Every dialect-specific
//! fragment (quoting, placeholders, existence checks, identity capture,
//! paging) is delegated to the active [`DialectStrategy`].
//!
//! # Generated shapes
//!
//! | Operation | SQL |
//! |-----------|-----|
//! | [`select`](StatementCompiler::select) | `SELECT t0.[Id] AS [id], ... FROM [dbo].[Order] t0 INNER JOIN ... WHERE ... ORDER BY ...` |
//! | [`exists`](StatementCompiler::exists) | dialect existence template over unqualified columns |
//! | [`find_by_key`](StatementCompiler::find_by_key) | `SELECT [Id] AS [id], ... FROM t WHERE [Id] = @p0` |
//! | [`insert`](StatementCompiler::insert) | `INSERT INTO t (...) VALUES (...)` + identity capture |
//! | [`update`](StatementCompiler::update) | `UPDATE t SET ... WHERE <key> [AND <revision> = @pN]` |
//! | [`delete`](StatementCompiler::delete) | `DELETE FROM t WHERE <key>` |
//! | [`page`](StatementCompiler::page) | dialect paging over a compiled select |
//!
//! Columns always follow attribute ordinal order. Joined definitions get
//! table aliases `t0`, `t1`, ... in relation declaration order.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use entity_sql_core::{
//!     ConnectionInfo, DatabaseDialect, EntityAttributeDefinition, EntityDefinition, Filter,
//!     SelectQuery, StatementCompiler, ValueType
//! };
//!
//! let widget = Arc::new(
//!     EntityDefinition::builder("", "Widget")
//!         .attribute(EntityAttributeDefinition::new("Id", "id", 0, ValueType::Int64).primary_key().identity())
//!         .attribute(EntityAttributeDefinition::new("Name", "name", 1, ValueType::String))
//!         .build()
//!         .unwrap()
//! );
//! let compiler = StatementCompiler::new(DatabaseDialect::Sqlite, Arc::new(ConnectionInfo::default()));
//! let command = compiler
//!     .select(&SelectQuery::new(widget).filter(Filter::eq("name", "bolt")))
//!     .unwrap();
//! assert_eq!(
//!     command.sql(),
//!     "SELECT t0.[Id] AS [id], t0.[Name] AS [name] FROM [Widget] t0 WHERE t0.[Name] = @p0"
//! );
//! ```

use std::{collections::HashSet, sync::Arc};

use tracing::debug;

use crate::{
    command::{CompiledCommand, ParameterSource, ParameterWriter, revision_value},
    config::ConnectionInfo,
    dialect::{DatabaseDialect, DialectStrategy, IdentityRead, InsertParts},
    error::{Error, Result},
    filter::{Column, Comparison, Filter, OrderBy},
    metadata::{EntityAttributeDefinition, EntityDefinition, RelationSet, ValueType},
    paging::SqlPageStatement,
    value::Value
};

/// A SELECT over an entity or relation graph.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    relations: RelationSet,
    filter:    Option<Filter>,
    order:     Vec<OrderBy>,
    distinct:  bool
}

impl SelectQuery {
    /// Select every attribute of `root`.
    pub fn new(root: Arc<EntityDefinition>) -> Self {
        Self::joined(RelationSet::new(root))
    }

    /// Select every attribute of every entity in `relations`.
    pub fn joined(relations: RelationSet) -> Self {
        Self {
            relations,
            filter: None,
            order: Vec::new(),
            distinct: false
        }
    }

    /// Restrict rows. Calling twice combines both filters with `AND`.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter
        });
        self
    }

    /// Append an ordering term.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    /// Emit `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn relations(&self) -> &RelationSet {
        &self.relations
    }

    #[must_use]
    pub fn filter_ref(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn ordering(&self) -> &[OrderBy] {
        &self.order
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }
}

/// One definition in a FROM clause with its table alias.
struct Source<'q> {
    definition: &'q EntityDefinition,
    alias:      String
}

/// Resolves filter and ordering columns to SQL.
enum Scope<'q> {
    /// Aliased sources of a SELECT; root first.
    Aliased(Vec<Source<'q>>),
    /// One table, unqualified columns (EXISTS, DELETE).
    Single(&'q EntityDefinition)
}

impl Scope<'_> {
    fn lookup(&self, column: &Column) -> Result<(Option<&str>, &EntityAttributeDefinition)> {
        match self {
            Self::Single(definition) => {
                if let Some(entity) = column.entity()
                    && !names_entity(definition, entity)
                {
                    return Err(unknown(entity, column));
                }
                Ok((None, definition.require(column.name())?))
            }
            Self::Aliased(sources) => {
                let candidates = sources
                    .iter()
                    .filter(|s| column.entity().is_none_or(|e| names_entity(s.definition, e)));
                let mut matched_entity = false;
                for source in candidates {
                    matched_entity = true;
                    if let Some(attribute) = source.definition.find(column.name()) {
                        return Ok((Some(source.alias.as_str()), attribute));
                    }
                }
                match (column.entity(), matched_entity) {
                    (Some(entity), false) => Err(unknown(entity, column)),
                    _ => {
                        let entity = column
                            .entity()
                            .map(str::to_string)
                            .or_else(|| sources.first().map(|s| s.definition.qualified_name()))
                            .unwrap_or_default();
                        Err(unknown(&entity, column))
                    }
                }
            }
        }
    }
}

fn names_entity(definition: &EntityDefinition, name: &str) -> bool {
    definition.entity() == name || definition.qualified_name() == name
}

fn unknown(entity: &str, column: &Column) -> Error {
    Error::UnknownAttribute {
        entity:    entity.to_string(),
        attribute: column.name().to_string()
    }
}

/// Compiles statements for one dialect and connection.
#[derive(Debug, Clone)]
pub struct StatementCompiler {
    dialect:    DatabaseDialect,
    connection: Arc<ConnectionInfo>
}

impl StatementCompiler {
    pub fn new(dialect: DatabaseDialect, connection: Arc<ConnectionInfo>) -> Self {
        Self {
            dialect,
            connection
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> DatabaseDialect {
        self.dialect
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<ConnectionInfo> {
        &self.connection
    }

    fn strategy(&self) -> &'static dyn DialectStrategy {
        self.dialect.strategy()
    }

    fn writer(&self) -> ParameterWriter<'_> {
        ParameterWriter::new(self.strategy(), &self.connection)
    }

    fn table(&self, definition: &EntityDefinition) -> Result<String> {
        self.strategy()
            .escape_table(definition.container(), definition.entity())
    }

    fn column(&self, alias: Option<&str>, attribute: &EntityAttributeDefinition) -> Result<String> {
        let escaped = self.strategy().escape_identifier(attribute.physical_name())?;
        Ok(match alias {
            Some(alias) => format!("{alias}.{escaped}"),
            None => escaped
        })
    }

    /// SELECT over the query's relation graph.
    ///
    /// Root columns are aliased by property name, joined columns by
    /// `<Entity>_<property>`, suffixed with a counter when that would
    /// collide.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] when the filter or ordering references
    /// an attribute absent from the graph.
    pub fn select(&self, query: &SelectQuery) -> Result<CompiledCommand> {
        let relations = query.relations();
        let strategy = self.strategy();

        let mut sources = vec![Source {
            definition: relations.root().as_ref(),
            alias:      "t0".to_string()
        }];
        let mut joins = Vec::with_capacity(relations.relations().len());
        for (index, relation) in relations.relations().iter().enumerate() {
            let alias = format!("t{}", index + 1);
            let source = sources
                .iter()
                .rev()
                .find(|s| s.definition == relation.source().as_ref())
                .ok_or_else(|| {
                    Error::configuration(
                        relations.root().qualified_name(),
                        format!("`{}` is not part of the join graph", relation.source().qualified_name())
                    )
                })?;
            let source_column = self.column(
                Some(&source.alias),
                relation.source().require(relation.source_attribute())?
            )?;
            let target_column = self.column(
                Some(&alias),
                relation.target().require(relation.target_attribute())?
            )?;
            joins.push(format!(
                "{} {} {alias} ON {source_column} = {target_column}",
                relation.kind().as_sql(),
                self.table(relation.target())?
            ));
            sources.push(Source {
                definition: relation.target().as_ref(),
                alias
            });
        }

        let mut projection = Vec::new();
        let mut taken = HashSet::new();
        for (position, source) in sources.iter().enumerate() {
            for attribute in source.definition.attributes() {
                let base = if position == 0 {
                    attribute.property_name().to_string()
                } else {
                    format!("{}_{}", source.definition.entity(), attribute.property_name())
                };
                let mut name = base.clone();
                let mut counter = 2;
                while !taken.insert(name.to_lowercase()) {
                    name = format!("{base}_{counter}");
                    counter += 1;
                }
                projection.push((source.alias.clone(), attribute, name));
            }
        }

        let mut sql = String::from("SELECT ");
        if query.is_distinct() {
            sql.push_str("DISTINCT ");
        }
        let columns = projection
            .iter()
            .map(|(alias, attribute, name)| {
                Ok(format!(
                    "{} AS {}",
                    self.column(Some(alias.as_str()), attribute)?,
                    strategy.escape_identifier(name)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(&columns.join(", "));
        sql.push_str(&format!(" FROM {} t0", self.table(relations.root())?));
        for join in &joins {
            sql.push(' ');
            sql.push_str(join);
        }

        let scope = Scope::Aliased(sources);
        let mut writer = self.writer();
        if let Some(filter) = query.filter_ref() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.render_filter(filter, &scope, &mut writer)?);
        }

        if !query.ordering().is_empty() {
            let mut terms = Vec::with_capacity(query.ordering().len());
            for order in query.ordering() {
                let (alias, attribute) = scope.lookup(order.column())?;
                // DISTINCT orders by output alias so paging can re-apply it
                // over a derived table.
                let target = if query.is_distinct() {
                    let (_, _, name) = projection
                        .iter()
                        .find(|(a, attr, _)| Some(a.as_str()) == alias && *attr == attribute)
                        .ok_or_else(|| unknown(relations.root().entity(), order.column()))?;
                    strategy.escape_identifier(name)?
                } else {
                    self.column(alias, attribute)?
                };
                terms.push(format!("{target} {}", order.direction().as_sql()));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        debug!(
            dialect = %self.dialect,
            entity = %relations.root().qualified_name(),
            joins = joins.len(),
            "compiled select"
        );
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// Existence check over one table.
    ///
    /// Without a filter the check is "any row".
    pub fn exists(&self, definition: &EntityDefinition, filter: Option<&Filter>) -> Result<CompiledCommand> {
        let scope = Scope::Single(definition);
        let mut writer = self.writer();
        let predicate = match filter {
            Some(filter) => self.render_filter(filter, &scope, &mut writer)?,
            None => "1 = 1".to_string()
        };
        let sql = self
            .strategy()
            .exists_sql(&self.table(definition)?, &predicate);
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// Existence check by primary key; key slots read entity properties.
    pub fn exists_by_key(&self, definition: &EntityDefinition) -> Result<CompiledCommand> {
        let mut writer = self.writer();
        let predicate = self.key_predicate(definition, &mut writer)?;
        let sql = self
            .strategy()
            .exists_sql(&self.table(definition)?, &predicate);
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// SELECT one row by primary key.
    pub fn find_by_key(&self, definition: &EntityDefinition) -> Result<CompiledCommand> {
        let strategy = self.strategy();
        let columns = definition
            .attributes()
            .iter()
            .map(|a| {
                Ok(format!(
                    "{} AS {}",
                    self.column(None, a)?,
                    strategy.escape_identifier(a.property_name())?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut writer = self.writer();
        let predicate = self.key_predicate(definition, &mut writer)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {predicate}",
            columns.join(", "),
            self.table(definition)?
        );
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// INSERT of every insertable attribute.
    ///
    /// When the definition has a row identity the dialect appends its
    /// identity capture; otherwise the insert captures nothing and
    /// executes as a non-query. A revision attribute is written as the
    /// first revision.
    pub fn insert(&self, definition: &EntityDefinition) -> Result<CompiledCommand> {
        let strategy = self.strategy();
        let mut writer = self.writer();
        let mut parts = InsertParts {
            table:   self.table(definition)?,
            columns: Vec::new(),
            values:  Vec::new()
        };
        for attribute in definition.insertable() {
            parts.columns.push(self.column(None, attribute)?);
            let placeholder = if attribute.is_revision() {
                let first = revision_value(attribute.property_name(), None, attribute.value_type())?;
                writer.push_typed(ParameterSource::Fixed(first), attribute.value_type())
            } else {
                writer.push_attribute(attribute)
            };
            parts.values.push(placeholder);
        }

        let identity = definition.identity().map(EntityAttributeDefinition::physical_name);
        let capture = strategy.capture_identity(&parts, identity)?;
        if let IdentityRead::OutParameter(name) = &capture.read {
            writer.push_named(name.as_str(), ParameterSource::Output);
        }
        Ok(CompiledCommand::new(capture.sql, writer.into_slots()).with_identity(capture.read))
    }

    /// Like [`insert`](Self::insert), but requires a row identity.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the definition has no identity
    /// attribute.
    pub fn insert_capturing(&self, definition: &EntityDefinition) -> Result<CompiledCommand> {
        if definition.identity().is_none() {
            return Err(Error::configuration(
                definition.qualified_name(),
                "identity capture requested but no row identity attribute is defined"
            ));
        }
        self.insert(definition)
    }

    /// UPDATE of every updatable attribute, keyed by primary key.
    ///
    /// With a revision attribute the new revision is written and the
    /// current one is matched, so a stale entity updates zero rows.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when nothing is updatable.
    pub fn update(&self, definition: &EntityDefinition) -> Result<CompiledCommand> {
        let mut writer = self.writer();
        let mut assignments = Vec::new();
        for attribute in definition.updatable() {
            let placeholder = writer.push_attribute(attribute);
            assignments.push(format!("{} = {placeholder}", self.column(None, attribute)?));
        }
        if let Some(revision) = definition.revision() {
            let placeholder = writer.push(ParameterSource::NextRevision {
                property:   revision.property_name().to_string(),
                value_type: revision.value_type()
            });
            assignments.push(format!("{} = {placeholder}", self.column(None, revision)?));
        }
        if assignments.is_empty() {
            return Err(Error::configuration(
                definition.qualified_name(),
                "no updatable attributes"
            ));
        }

        let mut predicate = self.key_predicate(definition, &mut writer)?;
        if let Some(revision) = definition.revision() {
            let placeholder = writer.push_attribute(revision);
            predicate.push_str(&format!(" AND {} = {placeholder}", self.column(None, revision)?));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {predicate}",
            self.table(definition)?,
            assignments.join(", ")
        );
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// DELETE one row by primary key.
    pub fn delete(&self, definition: &EntityDefinition) -> Result<CompiledCommand> {
        let mut writer = self.writer();
        let predicate = self.key_predicate(definition, &mut writer)?;
        let sql = format!("DELETE FROM {} WHERE {predicate}", self.table(definition)?);
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// DELETE every row matching `filter`.
    pub fn delete_where(&self, definition: &EntityDefinition, filter: &Filter) -> Result<CompiledCommand> {
        let mut writer = self.writer();
        let predicate = self.render_filter(filter, &Scope::Single(definition), &mut writer)?;
        let sql = format!("DELETE FROM {} WHERE {predicate}", self.table(definition)?);
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// Rewrite a compiled SELECT to return `take` rows after `skip`.
    ///
    /// The paging parameters are appended after the command's own slots.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when `take` is zero
    /// - [`Error::Configuration`] when the dialect cannot page the
    ///   statement (Oracle with an unaliased `*`)
    pub fn page(&self, command: &CompiledCommand, skip: u64, take: u64) -> Result<CompiledCommand> {
        if take == 0 {
            return Err(Error::invalid_argument("take", "must be greater than zero"));
        }
        let page = SqlPageStatement::parse(command.sql());
        let mut writer = ParameterWriter::with_slots(self.strategy(), &self.connection, command.slots().to_vec());
        let sql = self
            .strategy()
            .build_page_query(skip, take, &page, &mut writer)?;
        Ok(CompiledCommand::new(sql, writer.into_slots()))
    }

    /// `[a] = @p0 AND [b] = @p1` over the primary key.
    fn key_predicate(&self, definition: &EntityDefinition, writer: &mut ParameterWriter<'_>) -> Result<String> {
        let mut terms = Vec::new();
        for key in definition.primary_keys() {
            let placeholder = writer.push_attribute(key);
            terms.push(format!("{} = {placeholder}", self.column(None, key)?));
        }
        Ok(terms.join(" AND "))
    }

    fn render_filter(&self, filter: &Filter, scope: &Scope<'_>, writer: &mut ParameterWriter<'_>) -> Result<String> {
        let resolve = |column: &Column| -> Result<String> {
            let (alias, attribute) = scope.lookup(column)?;
            self.column(alias, attribute)
        };
        let typed = |column: &Column| -> Result<(String, ValueType)> {
            let (alias, attribute) = scope.lookup(column)?;
            Ok((self.column(alias, attribute)?, attribute.value_type()))
        };
        Ok(match filter {
            Filter::Compare(column, Comparison::Eq, Value::Null) => format!("{} IS NULL", resolve(column)?),
            Filter::Compare(column, Comparison::Ne, Value::Null) => format!("{} IS NOT NULL", resolve(column)?),
            Filter::Compare(column, op, value) => {
                let (column, value_type) = typed(column)?;
                let placeholder = writer.push_typed(ParameterSource::Fixed(value.clone()), value_type);
                format!("{column} {} {placeholder}", op.as_sql())
            }
            Filter::IsNull(column) => format!("{} IS NULL", resolve(column)?),
            Filter::IsNotNull(column) => format!("{} IS NOT NULL", resolve(column)?),
            Filter::In(column, values) => {
                let (column, value_type) = typed(column)?;
                if values.is_empty() {
                    "1 = 0".to_string()
                } else {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| writer.push_typed(ParameterSource::Fixed(v.clone()), value_type))
                        .collect();
                    format!("{column} IN ({})", placeholders.join(", "))
                }
            }
            Filter::And(items) => self.render_group(items, " AND ", "1 = 1", scope, writer)?,
            Filter::Or(items) => self.render_group(items, " OR ", "1 = 0", scope, writer)?,
            Filter::Not(inner) => format!("NOT ({})", self.render_filter(inner, scope, writer)?)
        })
    }

    fn render_group(
        &self,
        items: &[Filter],
        separator: &str,
        empty: &str,
        scope: &Scope<'_>,
        writer: &mut ParameterWriter<'_>
    ) -> Result<String> {
        match items {
            [] => Ok(empty.to_string()),
            [single] => self.render_filter(single, scope, writer),
            _ => {
                let parts = items
                    .iter()
                    .map(|item| self.render_filter(item, scope, writer))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", parts.join(separator)))
            }
        }
    }
}
