// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Compiled commands and bound statements.
//!
//! Compilation and binding are two separate steps:
//!
//! ```text
//! EntityDefinition ──compile──► CompiledCommand ──bind(values)──► Statement ──► Connection
//!                               (SQL + slots,                     (SQL + values,
//!                                memoized)                         fresh per call)
//! ```
//!
//! A [`CompiledCommand`] holds SQL text and an ordered list of [`Slot`]s
//! describing where each parameter value comes from. Binding resolves every
//! slot, in emission order, against a value lookup and yields a new
//! [`Statement`]. Compiled commands are never mutated by binding, so one
//! command can be shared by any number of concurrent executions.

use crate::{
    config::ConnectionInfo,
    dialect::{DialectStrategy, IdentityRead},
    error::{Error, Result},
    metadata::{EntityAttributeDefinition, ValueType},
    revision::next_revision,
    value::Value
};

/// Parameter direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterDirection {
    #[default]
    Input,
    /// Filled by the driver after execution (Oracle `RETURNING ... INTO`).
    Output
}

/// One bound parameter.
///
/// The value type is the declared type of the attribute the value was
/// read from, when there is one. Drivers that type their parameters use it
/// for `NULL`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name:       String,
    value:      Value,
    value_type: Option<ValueType>,
    direction:  ParameterDirection
}

impl Parameter {
    /// Input parameter.
    pub fn input(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name:       name.into(),
            value:      value.into(),
            value_type: None,
            direction:  ParameterDirection::Input
        }
    }

    /// Output parameter, initially `NULL`.
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            value:      Value::Null,
            value_type: None,
            direction:  ParameterDirection::Output
        }
    }

    /// Attach the declared type of the value.
    #[must_use]
    pub fn with_value_type(mut self, value_type: Option<ValueType>) -> Self {
        self.value_type = value_type;
        self
    }

    /// Name without prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    #[must_use]
    pub const fn direction(&self) -> ParameterDirection {
        self.direction
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }
}

/// Where a slot's value comes from at bind time.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSource {
    /// Current value of an entity property.
    Attribute(String),
    /// Value fixed at compile time (filter literals, paging bounds).
    Fixed(Value),
    /// Next revision after the property's current value.
    NextRevision {
        /// Revision property.
        property:   String,
        /// Declared type; the bound value keeps it.
        value_type: ValueType
    },
    /// Output parameter.
    Output
}

/// A named parameter position in a compiled command.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    name:       String,
    source:     ParameterSource,
    value_type: Option<ValueType>
}

impl Slot {
    pub fn new(name: impl Into<String>, source: ParameterSource) -> Self {
        Self {
            name: name.into(),
            source,
            value_type: None
        }
    }

    /// Declared type of the values bound here.
    #[must_use]
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn source(&self) -> &ParameterSource {
        &self.source
    }

    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        match &self.source {
            ParameterSource::NextRevision {
                value_type, ..
            } => Some(*value_type),
            _ => self.value_type
        }
    }
}

/// Allocates parameter names and dialect placeholders in emission order.
///
/// Parameters are named `p0`, `p1`, ...; the placeholder text is the
/// dialect's (`@p0`, `:p0`, `$1`, ...).
#[derive(Debug)]
pub struct ParameterWriter<'a> {
    dialect:    &'a dyn DialectStrategy,
    connection: &'a ConnectionInfo,
    slots:      Vec<Slot>
}

impl<'a> ParameterWriter<'a> {
    pub fn new(dialect: &'a dyn DialectStrategy, connection: &'a ConnectionInfo) -> Self {
        Self::with_slots(dialect, connection, Vec::new())
    }

    /// Continue after existing slots (paging an already compiled command).
    pub fn with_slots(
        dialect: &'a dyn DialectStrategy,
        connection: &'a ConnectionInfo,
        slots: Vec<Slot>
    ) -> Self {
        Self {
            dialect,
            connection,
            slots
        }
    }

    /// Append a slot, returning its placeholder.
    pub fn push(&mut self, source: ParameterSource) -> String {
        let name = format!("p{}", self.slots.len());
        self.push_named(name, source)
    }

    /// Append a slot with an explicit name, returning its placeholder.
    pub fn push_named(&mut self, name: impl Into<String>, source: ParameterSource) -> String {
        let name = name.into();
        let placeholder = self
            .dialect
            .placeholder(&name, self.slots.len() + 1, self.connection);
        self.slots.push(Slot::new(name, source));
        placeholder
    }

    /// Append a slot whose values have the declared type `value_type`.
    pub fn push_typed(&mut self, source: ParameterSource, value_type: ValueType) -> String {
        let placeholder = self.push(source);
        if let Some(slot) = self.slots.last_mut() {
            slot.value_type = Some(value_type);
        }
        placeholder
    }

    /// Slot reading the current value of `attribute`.
    pub fn push_attribute(&mut self, attribute: &EntityAttributeDefinition) -> String {
        self.push_typed(
            ParameterSource::Attribute(attribute.property_name().to_string()),
            attribute.value_type()
        )
    }

    /// Shorthand for a [`ParameterSource::Fixed`] slot.
    pub fn push_value(&mut self, value: impl Into<Value>) -> String {
        self.push(ParameterSource::Fixed(value.into()))
    }

    #[must_use]
    pub fn dialect(&self) -> &'a dyn DialectStrategy {
        self.dialect
    }

    #[must_use]
    pub fn connection(&self) -> &'a ConnectionInfo {
        self.connection
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn into_slots(self) -> Vec<Slot> {
        self.slots
    }
}

/// Immutable SQL text plus ordered parameter slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCommand {
    sql:      String,
    slots:    Vec<Slot>,
    identity: IdentityRead
}

impl CompiledCommand {
    pub fn new(sql: impl Into<String>, slots: Vec<Slot>) -> Self {
        Self {
            sql: sql.into(),
            slots,
            identity: IdentityRead::None
        }
    }

    /// Attach the identity read used by inserts.
    #[must_use]
    pub fn with_identity(mut self, identity: IdentityRead) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[must_use]
    pub const fn identity(&self) -> &IdentityRead {
        &self.identity
    }

    /// Bind values into a fresh [`Statement`].
    ///
    /// `values` looks up entity properties; it is only consulted for
    /// attribute and revision slots. Every value passes through the
    /// dialect's coercion, then the dialect's pre-execute hook runs.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when `values` has no value for a property
    /// slot, or a revision no longer fits its declared type.
    pub fn bind<F>(&self, dialect: &dyn DialectStrategy, values: F) -> Result<Statement>
    where
        F: Fn(&str) -> Option<Value>
    {
        let mut parameters = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let parameter = match slot.source() {
                ParameterSource::Attribute(property) => {
                    let value = values(property).ok_or_else(|| missing_value(property))?;
                    Parameter::input(slot.name(), dialect.map_parameter_value(value))
                        .with_value_type(slot.value_type())
                }
                ParameterSource::Fixed(value) => {
                    Parameter::input(slot.name(), dialect.map_parameter_value(value.clone()))
                        .with_value_type(slot.value_type())
                }
                ParameterSource::NextRevision {
                    property,
                    value_type
                } => {
                    let current = values(property).ok_or_else(|| missing_value(property))?;
                    let next = revision_value(property, current.as_i64(), *value_type)?;
                    Parameter::input(slot.name(), dialect.map_parameter_value(next))
                        .with_value_type(Some(*value_type))
                }
                ParameterSource::Output => Parameter::output(slot.name())
            };
            parameters.push(parameter);
        }

        let mut statement = Statement {
            sql: self.sql.clone(),
            parameters,
            bind_by_name: false,
            identity: self.identity.clone()
        };
        dialect.pre_execute(&mut statement);
        Ok(statement)
    }
}

fn missing_value(property: &str) -> Error {
    Error::configuration("statement", format!("no value bound for property `{property}`"))
}

pub(crate) fn revision_value(property: &str, current: Option<i64>, value_type: ValueType) -> Result<Value> {
    let next = next_revision(current);
    let overflow = || Error::configuration(property, format!("revision {next} overflows {value_type}"));
    Ok(match value_type {
        ValueType::Int16 => Value::I16(i16::try_from(next).map_err(|_| overflow())?),
        ValueType::Int32 => Value::I32(i32::try_from(next).map_err(|_| overflow())?),
        ValueType::UInt32 => Value::U32(u32::try_from(next).map_err(|_| overflow())?),
        ValueType::UInt64 => Value::U64(u64::try_from(next).map_err(|_| overflow())?),
        _ => Value::I64(next)
    })
}

/// SQL text with bound parameter values, ready for a [`Connection`](crate::driver::Connection).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql:          String,
    parameters:   Vec<Parameter>,
    bind_by_name: bool,
    identity:     IdentityRead
}

impl Statement {
    /// Statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql:          sql.into(),
            parameters:   Vec::new(),
            bind_by_name: false,
            identity:     IdentityRead::None
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in emission order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }

    /// Whether the driver must bind by name rather than by position.
    #[must_use]
    pub const fn bind_by_name(&self) -> bool {
        self.bind_by_name
    }

    pub fn set_bind_by_name(&mut self, bind_by_name: bool) {
        self.bind_by_name = bind_by_name;
    }

    /// How an insert reports the generated identity.
    #[must_use]
    pub const fn identity(&self) -> &IdentityRead {
        &self.identity
    }
}
