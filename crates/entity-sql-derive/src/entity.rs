// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity derive macro implementation.
//!
//! # Architecture
//!
//! ```text
//! entity.rs (orchestrator)
//! │
//! ├── parse/       → attribute parsing (EntityDef, FieldDef)
//! ├── describe.rs  → Entity::describe / Entity::value
//! └── row.rs       → FromRow
//! ```

mod describe;
pub mod parse;
mod row;

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use self::parse::EntityDef;

/// Main entry point for the Entity derive macro.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match EntityDef::from_derive_input(&input) {
        Ok(entity) => generate(&entity),
        Err(err) => err.write_errors().into()
    }
}

fn generate(entity: &EntityDef) -> TokenStream {
    let describe = describe::generate(entity);
    let row = row::generate(entity);

    let expanded = quote! {
        #describe
        #row
    };

    expanded.into()
}
