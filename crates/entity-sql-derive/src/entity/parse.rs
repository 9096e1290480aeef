// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Attribute parsing for `#[derive(Entity)]`.
//!
//! ```text
//! parse.rs (coordinator)
//! ├── entity.rs  - #[entity(...)] and struct-level validation
//! └── field.rs   - #[id], #[identity], #[revision], #[column(...)]
//! ```

mod entity;
mod field;

pub use entity::{EntityDef, RenameRule};
pub use field::FieldDef;
