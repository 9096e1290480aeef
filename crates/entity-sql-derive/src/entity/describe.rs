// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `Entity` implementation: metadata and property access.
//!
//! ```rust,ignore
//! impl ::entity_sql::Entity for Widget {
//!     fn describe() -> ::entity_sql::Result<::entity_sql::EntityDefinition> {
//!         ::entity_sql::EntityDefinition::builder("", "Widget")
//!             .attribute(
//!                 ::entity_sql::EntityAttributeDefinition::new("Id", "id", 0, <i64 as SqlType>::VALUE_TYPE)
//!                     .nullable(<i64 as SqlType>::NULLABLE)
//!                     .primary_key()
//!                     .identity()
//!             )
//!             .build()
//!     }
//!
//!     fn value(&self, property: &str) -> Option<::entity_sql::Value> {
//!         match property {
//!             "id" => Some(::entity_sql::Value::from(Clone::clone(&self.id))),
//!             _ => None
//!         }
//!     }
//! }
//! ```

use proc_macro2::TokenStream;
use quote::quote;

use super::parse::{EntityDef, FieldDef};

fn attribute(field: &FieldDef, ordinal: usize) -> TokenStream {
    let ty = &field.ty;
    let column = &field.column;
    let property = field.ident.to_string();

    let mut chain = quote! {
        ::entity_sql::EntityAttributeDefinition::new(
            #column,
            #property,
            #ordinal,
            <#ty as ::entity_sql::SqlType>::VALUE_TYPE
        )
        .nullable(<#ty as ::entity_sql::SqlType>::NULLABLE)
    };
    if field.is_id {
        chain.extend(quote!(.primary_key()));
    }
    if field.is_identity {
        chain.extend(quote!(.identity()));
    }
    if field.is_revision {
        chain.extend(quote!(.revision()));
    }
    if field.readonly {
        chain.extend(quote!(.read_only()));
    }
    if field.insert_only {
        chain.extend(quote!(.insert_only()));
    }
    chain
}

/// Generate `impl Entity`.
pub fn generate(entity: &EntityDef) -> TokenStream {
    let ident = &entity.ident;
    let (impl_generics, ty_generics, where_clause) = entity.generics.split_for_impl();
    let table = &entity.table;
    let schema = &entity.schema;

    let attributes = entity
        .mapped()
        .enumerate()
        .map(|(ordinal, field)| attribute(field, ordinal));

    let arms = entity.mapped().map(|field| {
        let name = &field.ident;
        let property = name.to_string();
        quote! {
            #property => ::core::option::Option::Some(
                ::entity_sql::Value::from(::core::clone::Clone::clone(&self.#name))
            ),
        }
    });

    quote! {
        impl #impl_generics ::entity_sql::Entity for #ident #ty_generics #where_clause {
            fn describe() -> ::entity_sql::Result<::entity_sql::EntityDefinition> {
                ::entity_sql::EntityDefinition::builder(#schema, #table)
                    #(.attribute(#attributes))*
                    .build()
            }

            fn value(&self, property: &str) -> ::core::option::Option<::entity_sql::Value> {
                match property {
                    #(#arms)*
                    _ => ::core::option::Option::None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: syn::DeriveInput) -> String {
        generate(&EntityDef::from_derive_input(&input).unwrap()).to_string()
    }

    #[test]
    fn flags_follow_markers() {
        let code = expand(syn::parse_quote! {
            #[entity(table = "Widget", schema = "dbo")]
            pub struct Widget {
                #[id]
                #[identity]
                pub id: i64,
                #[revision]
                pub rev: i64,
                #[column(readonly)]
                pub created: String,
            }
        });
        assert!(code.contains("builder (\"dbo\" , \"Widget\")"));
        assert!(code.contains(". primary_key ()"));
        assert!(code.contains(". identity ()"));
        assert!(code.contains(". revision ()"));
        assert!(code.contains(". read_only ()"));
    }

    #[test]
    fn skipped_field_has_no_attribute_or_arm() {
        let code = expand(syn::parse_quote! {
            pub struct Widget {
                #[id]
                pub id: i64,
                #[column(skip)]
                pub cache: Option<String>,
            }
        });
        assert!(!code.contains("\"cache\""));
        assert!(code.contains("\"id\" , 0usize"));
    }

    #[test]
    fn ordinals_skip_unmapped_fields() {
        let code = expand(syn::parse_quote! {
            pub struct Widget {
                #[column(skip)]
                pub cache: Option<String>,
                #[id]
                pub id: i64,
                pub name: String,
            }
        });
        assert!(code.contains("\"id\" , 0usize"));
        assert!(code.contains("\"name\" , 1usize"));
    }
}
