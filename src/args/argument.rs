// src/args/argument.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One parameter binding: a literal value or a reference into the
/// accumulator.
///
/// Exactly one of `value` / `reference` is set in a well-formed argument.
/// Both fields are kept optional so that malformed definitions coming from a
/// loader survive deserialization and surface as
/// [`ArgumentError::MalformedArgument`](crate::args::ArgumentError::MalformedArgument)
/// instead of silently picking one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// What an [`Argument`] binds to, once its shape has been checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding<'a> {
    Literal(&'a Value),
    Reference(&'a str),
}

impl Argument {
    pub fn literal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            reference: None,
        }
    }

    pub fn reference(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            reference: Some(reference.into()),
        }
    }

    /// `None` when both or neither side is set.
    pub fn binding(&self) -> Option<Binding<'_>> {
        match (&self.value, &self.reference) {
            (Some(v), None) => Some(Binding::Literal(v)),
            (None, Some(r)) => Some(Binding::Reference(r)),
            _ => None,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.binding().is_some()
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.binding(), Some(Binding::Reference(_)))
    }
}

/// Merge `overrides` into `base`: same-named arguments are replaced in place,
/// new names are appended in override order.
pub fn merge_overrides(base: &[Argument], overrides: &[Argument]) -> Vec<Argument> {
    let mut merged = base.to_vec();
    for arg in overrides {
        match merged.iter_mut().find(|a| a.name == arg.name) {
            Some(existing) => *existing = arg.clone(),
            None => merged.push(arg.clone()),
        }
    }
    merged
}
