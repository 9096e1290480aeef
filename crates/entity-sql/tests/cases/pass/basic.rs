// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Minimal entity with a generated identity.

use entity_sql::{Entity, FromRow, Row, Value};

#[derive(Debug, Clone, Entity)]
#[entity(table = "Widget")]
pub struct Widget {
    #[id]
    #[identity]
    pub id: i64,

    pub name: String,
}

fn main() {
    let definition = <Widget as entity_sql::Entity>::describe().unwrap();
    assert_eq!(definition.entity(), "Widget");
    assert_eq!(definition.attributes().len(), 2);
    assert!(definition.identity().is_some());

    let row = Row::from_pairs([("id", Value::I64(7)), ("name", Value::from("bolt"))]);
    let widget = Widget::from_row(&row).unwrap();
    assert_eq!(widget.id, 7);
    assert_eq!(
        <Widget as entity_sql::Entity>::value(&widget, "name"),
        Some(Value::from("bolt"))
    );
}
