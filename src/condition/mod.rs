// src/condition/mod.rs

//! Boolean trigger expressions and the value transforms that feed them.
//!
//! - [`transform`]: `ValueTransform`, a fail-soft single-value mapping.
//! - [`condition`]: `Condition`, one predicate leaf with its transforms.
//! - [`expression`]: `ConditionExpression`, the `and`/`or`/`xor` tree.
//!
//! Evaluation is pure with respect to the accumulator; nothing here writes to
//! it, so a tree can be re-evaluated against every delivered packet.

pub mod condition;
pub mod expression;
pub mod transform;

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::args::{Argument, resolve};
use crate::args::coerce::{coerce, describe};
use crate::engine::accumulator::Accumulator;
use crate::exec::invoke_guarded;
use crate::integration::{CallError, Invocation, Operation, OperationReturn};

pub use condition::Condition;
pub use expression::ConditionExpression;
pub use transform::{TransformFailure, ValueTransform};

/// Why a condition or transform could not produce a value.
#[derive(Error, Debug)]
pub enum EvaluationFailure {
    #[error("operation {integration}/{operation} is not available")]
    Unavailable {
        integration: String,
        operation: String,
    },

    #[error("invalid arguments: {0}")]
    Arguments(String),

    #[error("input {found} is not a valid {expected}")]
    Input { expected: String, found: String },

    #[error("predicate returned {0}, expected a boolean")]
    NotBoolean(String),

    #[error(transparent)]
    Call(#[from] CallError),
}

/// Resolve arguments, coerce the input to the declared input type and call
/// the operation. Shared by conditions and transforms.
pub(crate) fn run_operation(
    operation: Option<&Arc<Operation>>,
    integration: &str,
    operation_name: &str,
    arguments: &[Argument],
    input: &Value,
    accumulator: &Accumulator,
) -> Result<OperationReturn, EvaluationFailure> {
    let operation = operation.ok_or_else(|| EvaluationFailure::Unavailable {
        integration: integration.to_string(),
        operation: operation_name.to_string(),
    })?;

    let resolution = resolve(arguments, &operation.schema, Some(accumulator));
    if !resolution.is_ok() {
        return Err(EvaluationFailure::Arguments(resolution.error_message()));
    }
    let values: Map<String, Value> = resolution.values;

    let data = match &operation.schema.input {
        Some(ty) => coerce(input, ty).map_err(|e| EvaluationFailure::Input {
            expected: e.expected,
            found: describe(input),
        })?,
        None => input.clone(),
    };

    let invocation = Invocation::new(&values).with_input(&data);
    Ok(invoke_guarded(operation, &invocation)?)
}
