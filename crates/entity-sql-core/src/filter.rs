// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Selection criteria and ordering.
//!
//! A [`Filter`] is a small expression tree over entity attributes. Column
//! references are resolved by the statement compiler against the queried
//! definition (or relation graph); literal values always become bound
//! parameters, never SQL text.
//!
//! ```rust
//! use entity_sql_core::{Column, Filter};
//!
//! let filter = Filter::eq("name", "bolt")
//!     .and(Filter::gt("price", 1.5))
//!     .or(Filter::is_null(Column::of("Customer", "region")));
//! assert!(matches!(filter, Filter::Or(_)));
//! ```

use crate::{SortDirection, value::Value};

/// Attribute reference, optionally qualified by entity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    entity: Option<String>,
    name:   String
}

impl Column {
    /// Unqualified reference: root entity first, then joined entities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            entity: None,
            name:   name.into()
        }
    }

    /// Reference into a specific entity of a relation graph.
    pub fn of(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            name:   name.into()
        }
    }

    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Property or column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like
}

impl Comparison {
    /// SQL operator.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE"
        }
    }
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column <op> value`.
    Compare(Column, Comparison, Value),
    IsNull(Column),
    IsNotNull(Column),
    /// `column IN (...)`; an empty list matches nothing.
    In(Column, Vec<Value>),
    /// Conjunction; empty matches everything.
    And(Vec<Filter>),
    /// Disjunction; empty matches nothing.
    Or(Vec<Filter>),
    Not(Box<Filter>)
}

macro_rules! comparison_ctor {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[doc = concat!("`column ", stringify!($op), " value`.")]
            pub fn $name(column: impl Into<Column>, value: impl Into<Value>) -> Self {
                Self::Compare(column.into(), Comparison::$op, value.into())
            }
        )*
    };
}

impl Filter {
    comparison_ctor! {
        eq => Eq,
        ne => Ne,
        lt => Lt,
        le => Le,
        gt => Gt,
        ge => Ge,
    }

    /// `column LIKE pattern`.
    pub fn like(column: impl Into<Column>, pattern: impl Into<String>) -> Self {
        Self::Compare(column.into(), Comparison::Like, Value::String(pattern.into()))
    }

    pub fn is_null(column: impl Into<Column>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<Column>) -> Self {
        Self::IsNotNull(column.into())
    }

    /// `column IN (values...)`.
    pub fn any_of<I, V>(column: impl Into<Column>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>
    {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// Combine with `AND`, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut items) => {
                items.push(other);
                Self::And(items)
            }
            first => Self::And(vec![first, other])
        }
    }

    /// Combine with `OR`, flattening nested disjunctions.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut items) => {
                items.push(other);
                Self::Or(items)
            }
            first => Self::Or(vec![first, other])
        }
    }

    /// Negate.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Every column referenced, depth first.
    pub fn columns(&self) -> Vec<&Column> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Column>) {
        match self {
            Self::Compare(c, _, _) | Self::IsNull(c) | Self::IsNotNull(c) | Self::In(c, _) => out.push(c),
            Self::And(items) | Self::Or(items) => items.iter().for_each(|f| f.collect_columns(out)),
            Self::Not(inner) => inner.collect_columns(out)
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    column:    Column,
    direction: SortDirection
}

impl OrderBy {
    pub fn new(column: impl Into<Column>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction
        }
    }

    pub fn asc(column: impl Into<Column>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn desc(column: impl Into<Column>) -> Self {
        Self::new(column, SortDirection::Desc)
    }

    #[must_use]
    pub const fn column(&self) -> &Column {
        &self.column
    }

    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }
}
