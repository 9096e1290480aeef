// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Structured (JSON) bulk insert and upsert.
//!
//! A whole collection is serialized into one JSON array parameter and
//! expanded server-side into a recordset, so a bulk load is a single round
//! trip regardless of row count.
//!
//! # Builder
//!
//! [`JsonInsert`] is configured by value; every setter returns a new
//! builder with an empty compilation cache:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use entity_sql_core::{
//!     ConnectionInfo, DatabaseDialect, EntityAttributeDefinition, EntityDefinition, JsonInsert,
//!     ValueType
//! };
//!
//! let widget = Arc::new(
//!     EntityDefinition::builder("public", "Widget")
//!         .attribute(
//!             EntityAttributeDefinition::new("Id", "id", 0, ValueType::Int64)
//!                 .primary_key()
//!                 .identity()
//!         )
//!         .attribute(EntityAttributeDefinition::new("Name", "name", 1, ValueType::String))
//!         .attribute(EntityAttributeDefinition::new("Price", "price", 2, ValueType::Float64))
//!         .build()
//!         .unwrap()
//! );
//!
//! let insert = JsonInsert::new(widget, DatabaseDialect::PostgreSql, Arc::new(ConnectionInfo::default()))
//!     .insert_into(["Id", "Name", "Price"])
//!     .from(["Name", "Price"])
//!     .on_conflict(["Id"])
//!     .upsert(["Price"])
//!     .returning(["Id"]);
//!
//! assert_eq!(
//!     insert.sql().unwrap(),
//!     "INSERT INTO \"public\".\"Widget\" (\"Name\", \"Price\") \
//!      SELECT t.\"name\", t.\"price\" \
//!      FROM jsonb_to_recordset($1::jsonb) AS t(\"name\" text, \"price\" double precision) \
//!      ON CONFLICT (\"Id\") DO UPDATE SET \"Price\" = EXCLUDED.\"Price\" \
//!      RETURNING \"Id\";"
//! );
//! ```
//!
//! # Column pairing
//!
//! Sources are attributes of the item type, set with
//! [`JsonInsert::item_definition`]. Without one the items are assumed to
//! have the target entity's shape.
//!
//! | Configuration | Pairing |
//! |---------------|---------|
//! | no `from` | item attribute with the target's physical name; identity targets are skipped |
//! | `from` with as many columns as targets | positional |
//! | `from` with a different count | by physical name; identity targets without a source are skipped |
//!
//! Any other target without a source is a configuration error, and so is an
//! upsert column that is not inserted. Recordset columns are named after
//! the item properties, which is how `serde` names the fields of the
//! serialized rows, typed by the item attributes and ordered by their
//! ordinals.

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::debug;

use crate::{
    command::{CompiledCommand, ParameterWriter, Statement},
    config::ConnectionInfo,
    dialect::DatabaseDialect,
    error::{Error, Result},
    metadata::{EntityAttributeDefinition, EntityDefinition},
    value::Value
};

/// Reserved property name of the JSON payload slot.
pub const JSON_PAYLOAD: &str = "$json";

/// What to do when an inserted row collides with an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Let the database raise.
    #[default]
    Raise,
    /// Skip colliding rows.
    DoNothing,
    /// Resolve on `hints` (primary key when empty) and overwrite `targets`.
    Update {
        /// Conflict columns.
        hints:   Vec<String>,
        /// Columns overwritten on conflict; none means skip.
        targets: Vec<String>
    }
}

/// A target column and the source property feeding it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnPair<'a> {
    /// Column written.
    pub target: &'a EntityAttributeDefinition,
    /// Property read from each JSON row.
    pub source: &'a EntityAttributeDefinition
}

/// Conflict policy resolved against the definition.
#[derive(Debug, Clone)]
pub enum ResolvedConflict<'a> {
    Raise,
    DoNothing {
        /// Primary key columns.
        hints: Vec<&'a EntityAttributeDefinition>
    },
    Update {
        hints:   Vec<&'a EntityAttributeDefinition>,
        targets: Vec<&'a EntityAttributeDefinition>
    }
}

/// Everything a dialect needs to render a structured insert.
#[derive(Debug, Clone)]
pub struct JsonInsertPlan<'a> {
    table:     String,
    pairs:     Vec<ColumnPair<'a>>,
    sources:   Vec<&'a EntityAttributeDefinition>,
    conflict:  ResolvedConflict<'a>,
    returning: Vec<&'a EntityAttributeDefinition>
}

impl<'a> JsonInsertPlan<'a> {
    /// Escaped target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Target/source pairs in target order.
    #[must_use]
    pub fn pairs(&self) -> &[ColumnPair<'a>] {
        &self.pairs
    }

    /// Distinct source properties ordered by ordinal: the recordset shape.
    #[must_use]
    pub fn sources(&self) -> &[&'a EntityAttributeDefinition] {
        &self.sources
    }

    #[must_use]
    pub fn conflict(&self) -> &ResolvedConflict<'a> {
        &self.conflict
    }

    #[must_use]
    pub fn returning(&self) -> &[&'a EntityAttributeDefinition] {
        &self.returning
    }

    /// Source paired with `target`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when `target` is not written.
    pub fn source_for(&self, target: &EntityAttributeDefinition) -> Result<&'a EntityAttributeDefinition> {
        self.pairs
            .iter()
            .find(|p| p.target.physical_name() == target.physical_name())
            .map(|p| p.source)
            .ok_or_else(|| {
                Error::configuration(
                    self.table.as_str(),
                    format!("column `{}` has no source property", target.physical_name())
                )
            })
    }
}

/// Fluent builder of a structured bulk insert.
///
/// Compilation happens at most once per builder; binding produces a fresh
/// [`Statement`] on every call.
#[derive(Debug)]
pub struct JsonInsert {
    definition: Arc<EntityDefinition>,
    item:       Option<Arc<EntityDefinition>>,
    dialect:    DatabaseDialect,
    connection: Arc<ConnectionInfo>,
    targets:    Vec<String>,
    sources:    Vec<String>,
    conflict:   ConflictPolicy,
    returning:  Vec<String>,
    compiled:   OnceLock<CompiledCommand>
}

impl Clone for JsonInsert {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            item:       self.item.clone(),
            dialect:    self.dialect,
            connection: Arc::clone(&self.connection),
            targets:    self.targets.clone(),
            sources:    self.sources.clone(),
            conflict:   self.conflict.clone(),
            returning:  self.returning.clone(),
            compiled:   OnceLock::new()
        }
    }
}

fn resolve<'d>(definition: &'d EntityDefinition, names: &[String]) -> Result<Vec<&'d EntityAttributeDefinition>> {
    names.iter().map(|n| definition.require(n)).collect()
}

fn names<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>
{
    columns.into_iter().map(Into::into).collect()
}

impl JsonInsert {
    /// Builder for `definition` with default targets and conflict policy.
    pub fn new(definition: Arc<EntityDefinition>, dialect: DatabaseDialect, connection: Arc<ConnectionInfo>) -> Self {
        Self {
            definition,
            item: None,
            dialect,
            connection,
            targets: Vec::new(),
            sources: Vec::new(),
            conflict: ConflictPolicy::Raise,
            returning: Vec::new(),
            compiled: OnceLock::new()
        }
    }

    fn reconfigure(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self.compiled = OnceLock::new();
        self
    }

    /// Shape of the serialized items; `from` names resolve against it.
    ///
    /// Typically built with
    /// [`EntityDefinitionBuilder::build_shape`](crate::metadata::EntityDefinitionBuilder::build_shape).
    #[must_use]
    pub fn item_definition(self, item: Arc<EntityDefinition>) -> Self {
        self.reconfigure(|b| b.item = Some(item))
    }

    /// Target columns (property or column names).
    #[must_use]
    pub fn insert_into<I, S>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.reconfigure(|b| b.targets = names(targets))
    }

    /// Source properties read from each JSON row.
    #[must_use]
    pub fn from<I, S>(self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.reconfigure(|b| b.sources = names(sources))
    }

    /// Skip rows that collide with existing ones.
    #[must_use]
    pub fn on_conflict_do_nothing(self) -> Self {
        self.reconfigure(|b| b.conflict = ConflictPolicy::DoNothing)
    }

    /// Conflict columns for a subsequent [`upsert`](Self::upsert).
    #[must_use]
    pub fn on_conflict<I, S>(self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        let hints = names(hints);
        self.reconfigure(|b| {
            let targets = match std::mem::take(&mut b.conflict) {
                ConflictPolicy::Update {
                    targets, ..
                } => targets,
                _ => Vec::new()
            };
            b.conflict = ConflictPolicy::Update {
                hints,
                targets
            };
        })
    }

    /// Columns overwritten when a row collides.
    #[must_use]
    pub fn upsert<I, S>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        let targets = names(targets);
        self.reconfigure(|b| {
            let hints = match std::mem::take(&mut b.conflict) {
                ConflictPolicy::Update {
                    hints, ..
                } => hints,
                _ => Vec::new()
            };
            b.conflict = ConflictPolicy::Update {
                hints,
                targets
            };
        })
    }

    /// Columns returned for every inserted row.
    #[must_use]
    pub fn returning<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.reconfigure(|b| b.returning = names(columns))
    }

    #[must_use]
    pub fn definition(&self) -> &Arc<EntityDefinition> {
        &self.definition
    }

    /// Shape of the serialized items: the item definition, else the target.
    #[must_use]
    pub fn item(&self) -> &EntityDefinition {
        self.item.as_deref().unwrap_or(&self.definition)
    }

    #[must_use]
    pub const fn dialect(&self) -> DatabaseDialect {
        self.dialect
    }

    #[must_use]
    pub const fn conflict_policy(&self) -> &ConflictPolicy {
        &self.conflict
    }

    /// Whether the statement produces rows.
    #[must_use]
    pub fn has_returning(&self) -> bool {
        !self.returning.is_empty()
    }

    /// Resolve the configuration against the definition.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownAttribute`] for target names the entity lacks and
    ///   `from` names the item type lacks
    /// - [`Error::Configuration`] for unpaired targets, upsert columns that
    ///   are not inserted, or no columns
    pub fn plan(&self) -> Result<JsonInsertPlan<'_>> {
        let definition = self.definition.as_ref();
        let item = self.item();

        let targets = if self.targets.is_empty() {
            definition.insertable().collect()
        } else {
            resolve(definition, &self.targets)?
        };
        let sources = resolve(item, &self.sources)?;

        let unpaired = |target: &EntityAttributeDefinition| {
            Error::configuration(
                definition.qualified_name(),
                format!("target column `{}` has no source property", target.physical_name())
            )
        };

        let mut pairs = Vec::with_capacity(targets.len());
        if sources.is_empty() {
            for &target in targets.iter().filter(|t| !t.is_identity()) {
                let source = item
                    .attributes()
                    .iter()
                    .find(|s| s.physical_name() == target.physical_name())
                    .ok_or_else(|| unpaired(target))?;
                pairs.push(ColumnPair {
                    target,
                    source
                });
            }
        } else if sources.len() == targets.len() {
            pairs.extend(targets.iter().zip(&sources).map(|(&target, &source)| ColumnPair {
                target,
                source
            }));
        } else {
            for &target in &targets {
                match sources
                    .iter()
                    .find(|s| s.physical_name() == target.physical_name())
                {
                    Some(&source) => pairs.push(ColumnPair {
                        target,
                        source
                    }),
                    None if target.is_identity() => {}
                    None => return Err(unpaired(target))
                }
            }
        }
        if pairs.is_empty() {
            return Err(Error::configuration(definition.qualified_name(), "no columns to insert"));
        }

        let mut recordset: Vec<&EntityAttributeDefinition> = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            if !recordset.iter().any(|s| s.ordinal() == pair.source.ordinal()) {
                recordset.push(pair.source);
            }
        }
        recordset.sort_by_key(|s| s.ordinal());

        let conflict = match &self.conflict {
            ConflictPolicy::Raise => ResolvedConflict::Raise,
            ConflictPolicy::DoNothing => ResolvedConflict::DoNothing {
                hints: definition.primary_keys().collect()
            },
            ConflictPolicy::Update {
                hints,
                targets
            } => ResolvedConflict::Update {
                hints:   if hints.is_empty() {
                    definition.primary_keys().collect()
                } else {
                    resolve(definition, hints)?
                },
                targets: resolve(definition, targets)?
            }
        };

        if let ResolvedConflict::Update {
            targets, ..
        } = &conflict
            && let Some(missing) = targets
                .iter()
                .find(|t| !pairs.iter().any(|p| p.target.physical_name() == t.physical_name()))
        {
            return Err(Error::configuration(
                definition.qualified_name(),
                format!("upsert column `{}` is not among the inserted columns", missing.physical_name())
            ));
        }

        let strategy = self.dialect.strategy();
        Ok(JsonInsertPlan {
            table: strategy.escape_table(definition.container(), definition.entity())?,
            pairs,
            sources: recordset,
            conflict,
            returning: resolve(definition, &self.returning)?
        })
    }

    /// Compile once and return the cached command.
    ///
    /// # Errors
    ///
    /// Planning errors, [`Error::TypeMapping`] for source types without a
    /// recordset representation, and [`Error::Configuration`] on dialects
    /// without structured inserts. Failures are not cached.
    pub fn compile(&self) -> Result<&CompiledCommand> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(compiled);
        }
        let plan = self.plan()?;
        let strategy = self.dialect.strategy();
        let mut writer = ParameterWriter::new(strategy, &self.connection);
        let sql = strategy.render_json_insert(&plan, &mut writer)?;
        debug!(
            dialect = %self.dialect,
            entity = %self.definition.qualified_name(),
            sql = %sql,
            "structured insert compiled"
        );
        Ok(self
            .compiled
            .get_or_init(|| CompiledCommand::new(sql, writer.into_slots())))
    }

    /// Compiled SQL text.
    pub fn sql(&self) -> Result<&str> {
        self.compile().map(CompiledCommand::sql)
    }

    /// Serialize `items` into the payload parameter.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an empty collection,
    /// [`Error::Json`] when serialization fails, and compilation errors.
    pub fn bind<T: Serialize>(&self, items: &[T]) -> Result<Statement> {
        if items.is_empty() {
            return Err(Error::invalid_argument("items", "at least one row is required"));
        }
        let payload = serde_json::to_value(items)?;
        let command = self.compile()?;
        command.bind(self.dialect.strategy(), |property| {
            (property == JSON_PAYLOAD).then(|| Value::Json(payload.clone()))
        })
    }
}
