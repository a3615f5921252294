// src/args/resolver.rs

//! Resolve declared [`Argument`]s against an [`OperationSchema`].
//!
//! Resolution never stops at the first problem: every argument is examined
//! and every error is collected, so that a caller sees all of them at once.
//! One error is reported per distinct problem:
//!
//! - duplicate name -> `DuplicateArgument` (later occurrences are ignored)
//! - neither or both of value/reference -> `MalformedArgument`
//! - name not declared by the schema -> `UnknownParameter`
//! - reference with no accumulator entry -> `UnresolvedReference`
//! - value not coercible to the declared type -> `TypeMismatch`
//! - required parameter never supplied -> `MissingRequiredParameter`
//!
//! Optional parameters that were not supplied receive their declared default.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::args::argument::{Argument, Binding};
use crate::args::coerce::coerce;
use crate::engine::accumulator::Accumulator;
use crate::integration::schema::{OperationSchema, ParameterType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("argument '{parameter}' references '{reference}', which has no recorded result")]
    UnresolvedReference { parameter: String, reference: String },

    #[error("unknown parameter '{parameter}'")]
    UnknownParameter { parameter: String },

    #[error("missing required parameter '{parameter}'")]
    MissingRequiredParameter { parameter: String },

    #[error("parameter '{parameter}{path}' expected {expected}, found {found}")]
    TypeMismatch {
        parameter: String,
        path: String,
        expected: String,
        found: String,
    },

    #[error("argument '{parameter}' must set exactly one of value or reference")]
    MalformedArgument { parameter: String },

    #[error("parameter '{parameter}' is supplied more than once")]
    DuplicateArgument { parameter: String },
}

impl ArgumentError {
    /// Name of the parameter the error is about.
    pub fn parameter(&self) -> &str {
        match self {
            ArgumentError::UnresolvedReference { parameter, .. }
            | ArgumentError::UnknownParameter { parameter }
            | ArgumentError::MissingRequiredParameter { parameter }
            | ArgumentError::TypeMismatch { parameter, .. }
            | ArgumentError::MalformedArgument { parameter }
            | ArgumentError::DuplicateArgument { parameter } => parameter,
        }
    }
}

/// Output of [`resolve`]: whatever resolved, plus every error found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub values: Map<String, Value>,
    pub errors: Vec<ArgumentError>,
}

impl Resolution {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Resolved values if there were no errors at all.
    pub fn into_result(self) -> Result<Map<String, Value>, Vec<ArgumentError>> {
        if self.errors.is_empty() {
            Ok(self.values)
        } else {
            Err(self.errors)
        }
    }

    /// All error messages joined with `"; "`.
    pub fn error_message(&self) -> String {
        join_errors(&self.errors)
    }
}

pub fn join_errors(errors: &[ArgumentError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Resolve `arguments` against `schema`.
///
/// With `accumulator == None` (construction time) references are not looked
/// up; only their names are checked.
pub fn resolve(
    arguments: &[Argument],
    schema: &OperationSchema,
    accumulator: Option<&Accumulator>,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut supplied: HashSet<&str> = HashSet::new();

    for arg in arguments {
        let name = arg.name.as_str();
        if !supplied.insert(name) {
            resolution.errors.push(ArgumentError::DuplicateArgument {
                parameter: name.to_string(),
            });
            continue;
        }

        let Some(binding) = arg.binding() else {
            resolution.errors.push(ArgumentError::MalformedArgument {
                parameter: name.to_string(),
            });
            continue;
        };

        let declared = schema.find(name);
        if declared.is_none() {
            resolution.errors.push(ArgumentError::UnknownParameter {
                parameter: name.to_string(),
            });
        }
        let ty = declared.map(|p| &p.ty).unwrap_or(&ParameterType::Any);

        let raw = match binding {
            Binding::Literal(value) => value,
            Binding::Reference(reference) => match accumulator {
                None => continue,
                Some(acc) => match acc.get(reference) {
                    Some(value) => value,
                    None => {
                        resolution.errors.push(ArgumentError::UnresolvedReference {
                            parameter: name.to_string(),
                            reference: reference.to_string(),
                        });
                        continue;
                    }
                },
            },
        };

        match coerce(raw, ty) {
            Ok(value) if declared.is_some() => {
                resolution.values.insert(name.to_string(), value);
            }
            Ok(_) => {}
            Err(err) => resolution.errors.push(ArgumentError::TypeMismatch {
                parameter: name.to_string(),
                path: err.path,
                expected: err.expected,
                found: err.found,
            }),
        }
    }

    for param in &schema.parameters {
        if supplied.contains(param.name.as_str()) {
            continue;
        }
        if param.required {
            resolution.errors.push(ArgumentError::MissingRequiredParameter {
                parameter: param.name.clone(),
            });
        } else if let Some(default) = &param.default {
            resolution.values.insert(param.name.clone(), default.clone());
        }
    }

    resolution
}
