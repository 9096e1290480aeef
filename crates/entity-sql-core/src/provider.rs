// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Provider registration and repository construction.
//!
//! ```text
//! ProviderConfig ──► ProviderRegistry::resolve ──► DatabaseDialect
//!        │                                              │
//!        └── connection string ──► RepositoryProvider ◄─┘
//!                                       │
//!                                       └── repository::<E, C>(conn)
//! ```
//!
//! Both registries are explicitly owned values. Construct them once at
//! startup and share them by `Arc`.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock}
};

use tracing::info;

use crate::{
    compiler::StatementCompiler,
    config::{ConnectionInfo, ProviderConfig},
    dialect::DatabaseDialect,
    driver::Connection,
    entity::Entity,
    error::{Error, Result, require_non_blank},
    metadata::DefinitionRegistry,
    repository::Repository,
    structured::JsonInsert
};

/// Provider invariant names mapped to dialects.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, DatabaseDialect>>
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `invariant` unless it is already known.
    ///
    /// Returns `true` when this call added the entry. An existing entry is
    /// never replaced.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a blank invariant name.
    pub fn register_if_absent(&self, invariant: &str, dialect: DatabaseDialect) -> Result<bool> {
        require_non_blank("invariant", invariant)?;
        let key = invariant.trim().to_lowercase();
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if providers.contains_key(&key) {
            return Ok(false);
        }
        providers.insert(key, dialect);
        info!(provider = invariant, %dialect, "registered database provider");
        Ok(true)
    }

    /// Dialect of a registered invariant, falling back to well-known
    /// provider names.
    #[must_use]
    pub fn resolve(&self, invariant: &str) -> Option<DatabaseDialect> {
        let key = invariant.trim().to_lowercase();
        let registered = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied();
        registered.or_else(|| DatabaseDialect::from_provider(invariant))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hands out repositories bound to one connection string and dialect.
#[derive(Debug, Clone)]
pub struct RepositoryProvider {
    compiler:    StatementCompiler,
    definitions: Arc<DefinitionRegistry>
}

impl RepositoryProvider {
    pub fn new(dialect: DatabaseDialect, connection: ConnectionInfo, definitions: Arc<DefinitionRegistry>) -> Self {
        Self {
            compiler: StatementCompiler::new(dialect, Arc::new(connection)),
            definitions
        }
    }

    /// Resolve the dialect of `config` and register its provider once.
    ///
    /// The dialect comes from `config.dialect`, else from the registered or
    /// well-known provider invariant.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when no dialect can be determined.
    pub fn from_config(
        config: &ProviderConfig,
        providers: &ProviderRegistry,
        definitions: Arc<DefinitionRegistry>
    ) -> Result<Self> {
        let dialect = config
            .dialect
            .or_else(|| providers.resolve(&config.provider))
            .ok_or_else(|| {
                Error::configuration(
                    config.provider.as_str(),
                    "unknown provider; set `dialect` explicitly"
                )
            })?;
        providers.register_if_absent(&config.provider, dialect)?;
        Ok(Self::new(dialect, config.connection_info(), definitions))
    }

    #[must_use]
    pub const fn dialect(&self) -> DatabaseDialect {
        self.compiler.dialect()
    }

    #[must_use]
    pub fn connection_info(&self) -> &ConnectionInfo {
        self.compiler.connection()
    }

    #[must_use]
    pub fn compiler(&self) -> &StatementCompiler {
        &self.compiler
    }

    #[must_use]
    pub fn definitions(&self) -> &Arc<DefinitionRegistry> {
        &self.definitions
    }

    /// Repository for `E` over `connection`.
    ///
    /// # Errors
    ///
    /// Invalid metadata of `E`.
    pub fn repository<E: Entity, C: Connection>(&self, connection: C) -> Result<Repository<E, C>> {
        Repository::from_registry(connection, self.compiler.clone(), &self.definitions)
    }

    /// Structured insert builder for `E`.
    pub fn json_insert<E: Entity>(&self) -> Result<JsonInsert> {
        Ok(JsonInsert::new(
            self.definitions.find::<E>()?,
            self.dialect(),
            Arc::clone(self.compiler.connection())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once() {
        let registry = ProviderRegistry::new();
        assert!(registry.register_if_absent("Acme.Data", DatabaseDialect::Sqlite).unwrap());
        assert!(!registry.register_if_absent("acme.data", DatabaseDialect::MySql).unwrap());
        assert_eq!(registry.resolve("ACME.DATA"), Some(DatabaseDialect::Sqlite));
        assert_eq!(registry.len(), 1);
        assert!(registry.register_if_absent(" ", DatabaseDialect::Sqlite).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn resolve_falls_back_to_well_known_names() {
        let registry = ProviderRegistry::new();
        assert_eq!(registry.resolve("Npgsql"), Some(DatabaseDialect::PostgreSql));
        assert_eq!(registry.resolve("Unknown.Provider"), None);
    }

    #[test]
    fn from_config_resolves_and_registers() {
        let providers = ProviderRegistry::new();
        let config = ProviderConfig {
            provider:          "Oracle.ManagedDataAccess.Client".into(),
            connection_string: "Data Source=orcl".into(),
            dialect:           None
        };
        let provider = RepositoryProvider::from_config(&config, &providers, Arc::default()).unwrap();
        assert_eq!(provider.dialect(), DatabaseDialect::Oracle);
        assert_eq!(provider.connection_info().get("data source"), Some("orcl"));
        assert_eq!(providers.len(), 1);
    }

    #[test]
    fn explicit_dialect_wins() {
        let providers = ProviderRegistry::new();
        let config = ProviderConfig {
            provider:          "Npgsql".into(),
            connection_string: String::new(),
            dialect:           Some(DatabaseDialect::MySql)
        };
        let provider = RepositoryProvider::from_config(&config, &providers, Arc::default()).unwrap();
        assert_eq!(provider.dialect(), DatabaseDialect::MySql);
    }

    #[test]
    fn unknown_provider_is_configuration_error() {
        let config = ProviderConfig {
            provider:          "Acme".into(),
            connection_string: String::new(),
            dialect:           None
        };
        let err = RepositoryProvider::from_config(&config, &ProviderRegistry::new(), Arc::default()).unwrap_err();
        assert!(err.is_configuration());
    }
}
