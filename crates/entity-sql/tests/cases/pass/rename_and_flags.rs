// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Column renaming, read-only columns, revisions and skipped fields.

use entity_sql::Entity;

#[derive(Debug, Clone, Entity)]
#[entity(rename_all = "PascalCase")]
pub struct Account {
    #[id]
    #[identity]
    pub account_id: i64,

    #[column(name = "display")]
    pub display_name: String,

    #[column(readonly)]
    pub balance: f64,

    #[revision]
    pub row_version: i32,

    #[column(skip)]
    pub cached: Option<String>,
}

fn main() {
    let definition = <Account as entity_sql::Entity>::describe().unwrap();
    assert_eq!(definition.entity(), "Account");
    assert_eq!(definition.find("account_id").unwrap().physical_name(), "AccountId");
    assert_eq!(definition.find("display_name").unwrap().physical_name(), "display");
    assert!(!definition.find("balance").unwrap().is_insertable());
    assert_eq!(definition.revision().unwrap().physical_name(), "RowVersion");
    assert!(definition.find("cached").is_none());
}
