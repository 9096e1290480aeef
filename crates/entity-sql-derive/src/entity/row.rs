// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `FromRow` implementation.
//!
//! Mapped fields are read by property name, which is the alias the statement
//! compiler gives every projected column. Skipped fields take their
//! `Default`.

use proc_macro2::TokenStream;
use quote::quote;

use super::parse::EntityDef;

/// Generate `impl FromRow`.
pub fn generate(entity: &EntityDef) -> TokenStream {
    let ident = &entity.ident;
    let (impl_generics, ty_generics, where_clause) = entity.generics.split_for_impl();

    let fields = entity.fields.iter().map(|field| {
        let name = &field.ident;
        if field.skip {
            quote! { #name: ::core::default::Default::default() }
        } else {
            let property = name.to_string();
            quote! { #name: row.try_get(#property)? }
        }
    });

    quote! {
        impl #impl_generics ::entity_sql::FromRow for #ident #ty_generics #where_clause {
            fn from_row(row: &::entity_sql::Row) -> ::entity_sql::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#fields),*
                })
            }
        }
    }
}
