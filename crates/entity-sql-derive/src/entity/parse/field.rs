// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field-level attribute parsing.
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | `#[id]` | primary key, never updated |
//! | `#[identity]` | database generated, never written |
//! | `#[revision]` | optimistic concurrency counter |
//! | `#[column(name = "...")]` | explicit column name |
//! | `#[column(readonly)]` | never written |
//! | `#[column(insert_only)]` | never updated |
//! | `#[column(skip)]` | not mapped |

use darling::FromMeta;
use syn::{Attribute, Field, Ident, Type};

use super::RenameRule;

/// Arguments of `#[column(...)]`.
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct ColumnArgs {
    name:        Option<String>,
    readonly:    bool,
    insert_only: bool,
    skip:        bool
}

/// One named field with its mapping.
#[derive(Debug)]
pub struct FieldDef {
    /// Field identifier; also the property name.
    pub ident:       Ident,
    /// Field type.
    pub ty:          Type,
    /// Column name in the database.
    pub column:      String,
    /// `#[id]`
    pub is_id:       bool,
    /// `#[identity]`
    pub is_identity: bool,
    /// `#[revision]`
    pub is_revision: bool,
    /// `#[column(readonly)]`
    pub readonly:    bool,
    /// `#[column(insert_only)]`
    pub insert_only: bool,
    /// `#[column(skip)]`
    pub skip:        bool
}

fn is_marker(attr: &Attribute, name: &str) -> darling::Result<bool> {
    if !attr.path().is_ident(name) {
        return Ok(false);
    }
    attr.meta.require_path_only()?;
    Ok(true)
}

impl FieldDef {
    /// Parse a named field.
    ///
    /// # Errors
    ///
    /// - unnamed field
    /// - arguments on `#[id]`, `#[identity]` or `#[revision]`
    /// - malformed or repeated `#[column(...)]`
    /// - blank column name
    /// - `skip` combined with a key, identity or revision marker
    /// - `readonly` combined with `insert_only`
    pub fn from_field(field: &Field, rename: Option<RenameRule>) -> darling::Result<Self> {
        let ident = field.ident.clone().ok_or_else(|| {
            darling::Error::custom("Entity fields must be named").with_span(field)
        })?;

        let mut errors = darling::Error::accumulator();
        let mut is_id = false;
        let mut is_identity = false;
        let mut is_revision = false;
        let mut column: Option<ColumnArgs> = None;

        for attr in &field.attrs {
            is_id |= errors.handle(is_marker(attr, "id")).unwrap_or(false);
            is_identity |= errors.handle(is_marker(attr, "identity")).unwrap_or(false);
            is_revision |= errors.handle(is_marker(attr, "revision")).unwrap_or(false);

            if attr.path().is_ident("column") {
                if column.is_some() {
                    errors.push(
                        darling::Error::custom("duplicate #[column] attribute").with_span(attr)
                    );
                    continue;
                }
                column = errors.handle(ColumnArgs::from_meta(&attr.meta));
            }
        }

        let args = column.unwrap_or_default();
        let name = ident.to_string();
        let column_name = match (&args.name, rename) {
            (Some(explicit), _) => explicit.clone(),
            (None, Some(rule)) => rule.apply(&name),
            (None, None) => name
        };

        if column_name.trim().is_empty() {
            errors.push(darling::Error::custom("column name must not be blank").with_span(&ident));
        }
        if args.skip && (is_id || is_identity || is_revision) {
            errors.push(
                darling::Error::custom("a skipped field cannot be #[id], #[identity] or #[revision]")
                    .with_span(&ident)
            );
        }
        if args.readonly && args.insert_only {
            errors.push(
                darling::Error::custom("`readonly` and `insert_only` are mutually exclusive")
                    .with_span(&ident)
            );
        }

        errors.finish()?;

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            column: column_name,
            is_id,
            is_identity,
            is_revision,
            readonly: args.readonly,
            insert_only: args.insert_only,
            skip: args.skip
        })
    }
}

#[cfg(test)]
mod tests {
    use syn::{Field, FieldsNamed};

    use super::*;

    fn first(fields: FieldsNamed) -> Field {
        fields.named.into_iter().next().unwrap()
    }

    #[test]
    fn plain_field() {
        let field = first(syn::parse_quote!({ pub name: String }));
        let def = FieldDef::from_field(&field, None).unwrap();
        assert_eq!(def.column, "name");
        assert!(!def.is_id && !def.skip && !def.readonly);
    }

    #[test]
    fn markers() {
        let field = first(syn::parse_quote!({
            #[id]
            #[identity]
            pub id: i64
        }));
        let def = FieldDef::from_field(&field, None).unwrap();
        assert!(def.is_id);
        assert!(def.is_identity);
        assert!(!def.is_revision);
    }

    #[test]
    fn column_arguments() {
        let field = first(syn::parse_quote!({
            #[column(name = "created_on", readonly)]
            pub created: String
        }));
        let def = FieldDef::from_field(&field, Some(RenameRule::Pascal)).unwrap();
        assert_eq!(def.column, "created_on");
        assert!(def.readonly);
    }

    #[test]
    fn marker_with_arguments_fails() {
        let field = first(syn::parse_quote!({
            #[id(auto)]
            pub id: i64
        }));
        assert!(FieldDef::from_field(&field, None).is_err());
    }

    #[test]
    fn skipped_key_fails() {
        let field = first(syn::parse_quote!({
            #[id]
            #[column(skip)]
            pub id: i64
        }));
        assert!(FieldDef::from_field(&field, None).is_err());
    }

    #[test]
    fn readonly_and_insert_only_fail() {
        let field = first(syn::parse_quote!({
            #[column(readonly, insert_only)]
            pub stamp: i64
        }));
        assert!(FieldDef::from_field(&field, None).is_err());
    }

    #[test]
    fn duplicate_column_fails() {
        let field = first(syn::parse_quote!({
            #[column(name = "a")]
            #[column(name = "b")]
            pub x: i64
        }));
        assert!(FieldDef::from_field(&field, None).is_err());
    }

    #[test]
    fn unknown_column_argument_fails() {
        let field = first(syn::parse_quote!({
            #[column(unique)]
            pub x: i64
        }));
        assert!(FieldDef::from_field(&field, None).is_err());
    }
}
