// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Error type shared by every layer of the engine.
//!
//! | Kind | Variant | Raised by |
//! |------|---------|-----------|
//! | Invalid argument | [`Error::InvalidArgument`] | call boundaries (blank names, empty collections) |
//! | Configuration | [`Error::Configuration`] | unmet capability preconditions |
//! | Unknown attribute | [`Error::UnknownAttribute`] | filters and builders naming missing columns |
//! | Type mapping | [`Error::TypeMapping`] | structured inserts with unsupported types |
//! | Mapping | [`Error::Mapping`] | row readers converting column values |
//! | Concurrency | [`Error::Concurrency`] | revision-checked updates matching no row |
//! | Cancelled | [`Error::Cancelled`] | [`cancellable`](crate::cancellable) |
//! | Driver | [`Error::Driver`] | connection implementations, passed through verbatim |
//!
//! Nothing in the engine retries: statement shape and conflict policy are
//! deterministic, so every error reaches the repository caller unchanged.

use std::error::Error as StdError;

use crate::{dialect::DatabaseDialect, metadata::ValueType};

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed driver error.
pub type BoxDynError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced while compiling or executing statements.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input was null, blank or empty.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name:   &'static str,
        /// Why the value was rejected.
        reason: String
    },

    /// A capability was requested whose preconditions are not met.
    #[error("{object}: {message}")]
    Configuration {
        /// Object the error is about (entity, dialect, builder...).
        object:  String,
        /// Human-readable explanation.
        message: String
    },

    /// A column reference could not be resolved against the metadata.
    #[error("attribute `{attribute}` is not defined on `{entity}`")]
    UnknownAttribute {
        /// Entity (or relation graph root) that was searched.
        entity:    String,
        /// The name that failed to resolve.
        attribute: String
    },

    /// A value type has no native representation in the dialect.
    #[error("value type `{value_type}` has no {dialect} representation")]
    TypeMapping {
        /// Offending value type.
        value_type: ValueType,
        /// Dialect that was asked for a native name.
        dialect:    DatabaseDialect
    },

    /// A row value could not be converted into the requested type.
    #[error("column `{column}`: {message}")]
    Mapping {
        /// Column being read.
        column:  String,
        /// Conversion failure description.
        message: String
    },

    /// An optimistic revision check matched no row.
    #[error("revision conflict on `{entity}`: row is no longer at revision {expected}")]
    Concurrency {
        /// Entity being updated.
        entity:   String,
        /// Revision the caller held.
        expected: i64
    },

    /// The operation was cancelled before the driver completed.
    #[error("operation cancelled")]
    Cancelled,

    /// JSON serialization of a structured command payload failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Error reported by the database driver.
    #[error(transparent)]
    Driver(BoxDynError)
}

impl Error {
    /// Build an [`Error::InvalidArgument`].
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into()
        }
    }

    /// Build an [`Error::Configuration`].
    pub fn configuration(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            object:  object.into(),
            message: message.into()
        }
    }

    /// Wrap a driver error.
    pub fn driver(err: impl Into<BoxDynError>) -> Self {
        Self::Driver(err.into())
    }

    /// Check if this is an invalid argument error.
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Check if this is a configuration error.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this is an unresolved attribute reference.
    pub const fn is_unknown_attribute(&self) -> bool {
        matches!(self, Self::UnknownAttribute { .. })
    }

    /// Check if this is an optimistic revision conflict.
    pub const fn is_concurrency(&self) -> bool {
        matches!(self, Self::Concurrency { .. })
    }

    /// Check if the operation was cancelled.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a type mapping error.
    pub const fn is_type_mapping(&self) -> bool {
        matches!(self, Self::TypeMapping { .. })
    }

    /// Check if this error came from the driver.
    pub const fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

/// Reject blank strings at a call boundary.
pub(crate) fn require_non_blank(name: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument(name, "must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display() {
        let err = Error::invalid_argument("identifier", "must not be blank");
        assert_eq!(
            err.to_string(),
            "invalid argument `identifier`: must not be blank"
        );
        assert!(err.is_invalid_argument());
        assert!(!err.is_configuration());
    }

    #[test]
    fn type_mapping_names_the_type() {
        let err = Error::TypeMapping {
            value_type: ValueType::Bytes,
            dialect:    DatabaseDialect::PostgreSql
        };
        let text = err.to_string();
        assert!(text.contains("Bytes"));
        assert!(text.contains("postgres"));
        assert!(err.is_type_mapping());
    }

    #[test]
    fn driver_error_is_transparent() {
        let err = Error::driver(std::io::Error::other("duplicate key"));
        assert_eq!(err.to_string(), "duplicate key");
        assert!(err.is_driver());
    }

    #[test]
    fn require_non_blank_rejects_whitespace() {
        assert!(require_non_blank("name", "  ").is_err());
        assert!(require_non_blank("name", "Id").is_ok());
    }
}
