// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Composite primary key with schema and nullable columns.

use chrono::NaiveDateTime;
use entity_sql::Entity;
use uuid::Uuid;

#[derive(Debug, Clone, Entity)]
#[entity(table = "order_lines", schema = "sales")]
pub struct OrderLine {
    #[id]
    pub order_id: Uuid,

    #[id]
    pub line_no: i32,

    pub note: Option<String>,

    #[column(insert_only)]
    pub created: NaiveDateTime,
}

fn main() {
    let definition = <OrderLine as entity_sql::Entity>::describe().unwrap();
    assert_eq!(definition.container(), "sales");
    assert_eq!(definition.primary_keys().count(), 2);
    assert!(definition.identity().is_none());
    assert!(definition.find("note").unwrap().is_nullable());
}
