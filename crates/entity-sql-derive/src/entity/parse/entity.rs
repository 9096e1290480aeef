// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity-level attribute parsing with darling.
//!
//! # Supported Attributes
//!
//! | Attribute | Required | Default | Description |
//! |-----------|----------|---------|-------------|
//! | `table` | No | struct name | Table name |
//! | `schema` | No | none | Schema (container) |
//! | `rename_all` | No | none | Column naming rule |

use convert_case::{Case, Casing};
use darling::{FromDeriveInput, FromMeta};
use syn::{DeriveInput, Generics, Ident};

use super::field::FieldDef;

/// Naming rule applied to field names without an explicit column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// `PascalCase`
    Pascal,
    /// `camelCase`
    Camel,
    /// `snake_case`
    Snake,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnake,
    /// `kebab-case`
    Kebab,
    /// `lowercase`
    Lower,
    /// `UPPERCASE`
    Upper
}

impl RenameRule {
    /// Apply the rule to a field name.
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Pascal => name.to_case(Case::Pascal),
            Self::Camel => name.to_case(Case::Camel),
            Self::Snake => name.to_case(Case::Snake),
            Self::ScreamingSnake => name.to_case(Case::Snake).to_uppercase(),
            Self::Kebab => name.to_case(Case::Kebab),
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase()
        }
    }
}

impl FromMeta for RenameRule {
    fn from_string(value: &str) -> darling::Result<Self> {
        match value {
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            "kebab-case" => Ok(Self::Kebab),
            "lowercase" => Ok(Self::Lower),
            "UPPERCASE" => Ok(Self::Upper),
            _ => Err(darling::Error::unknown_value(value))
        }
    }
}

/// Raw `#[entity(...)]` attributes.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(entity))]
struct EntityAttrs {
    ident: Ident,

    generics: Generics,

    #[darling(default)]
    table: Option<String>,

    #[darling(default)]
    schema: Option<String>,

    #[darling(default)]
    rename_all: Option<RenameRule>
}

/// Parsed entity: struct identity plus validated fields.
#[derive(Debug)]
pub struct EntityDef {
    /// Struct identifier.
    pub ident:    Ident,
    /// Generics of the struct, carried onto the impls.
    pub generics: Generics,
    /// Table name.
    pub table:    String,
    /// Schema name, empty when unqualified.
    pub schema:   String,
    /// All named fields in declaration order, skipped ones included.
    pub fields:   Vec<FieldDef>
}

impl EntityDef {
    /// Parse and validate a derive input.
    ///
    /// # Errors
    ///
    /// - applied to an enum, union, tuple struct or unit struct
    /// - blank `table`
    /// - no `#[id]` field
    /// - more than one `#[identity]` or `#[revision]` field
    /// - invalid field attributes (see [`FieldDef::from_field`])
    pub fn from_derive_input(input: &DeriveInput) -> darling::Result<Self> {
        let attrs = EntityAttrs::from_derive_input(input)?;

        let named = match &input.data {
            syn::Data::Struct(data) => match &data.fields {
                syn::Fields::Named(named) => &named.named,
                _ => {
                    return Err(darling::Error::custom("Entity requires named fields")
                        .with_span(&input.ident));
                }
            },
            _ => {
                return Err(
                    darling::Error::custom("Entity can only be derived for structs")
                        .with_span(&input.ident)
                );
            }
        };

        let mut errors = darling::Error::accumulator();
        let fields: Vec<FieldDef> = named
            .iter()
            .filter_map(|field| errors.handle(FieldDef::from_field(field, attrs.rename_all)))
            .collect();

        let table = attrs.table.unwrap_or_else(|| attrs.ident.to_string());
        if table.trim().is_empty() {
            errors.push(darling::Error::custom("`table` must not be blank").with_span(&attrs.ident));
        }

        if !fields.iter().any(|f| f.is_id) {
            errors.push(
                darling::Error::custom("Entity must have at least one field with #[id] attribute")
                    .with_span(&attrs.ident)
            );
        }
        for field in fields.iter().filter(|f| f.is_identity).skip(1) {
            errors.push(
                darling::Error::custom("only one field may be marked #[identity]")
                    .with_span(&field.ident)
            );
        }
        for field in fields.iter().filter(|f| f.is_revision).skip(1) {
            errors.push(
                darling::Error::custom("only one field may be marked #[revision]")
                    .with_span(&field.ident)
            );
        }

        errors.finish()?;

        Ok(Self {
            ident: attrs.ident,
            generics: attrs.generics,
            table,
            schema: attrs.schema.unwrap_or_default(),
            fields
        })
    }

    /// Fields that map onto columns.
    pub fn mapped(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.skip)
    }
}
