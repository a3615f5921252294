// src/condition/transform.rs

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::args::{Argument, resolve};
use crate::condition::{EvaluationFailure, run_operation};
use crate::engine::accumulator::Accumulator;
use crate::errors::DefinitionError;
use crate::integration::{IntegrationRegistry, Operation, OperationKind};

/// Internal failure of a transform. Always swallowed by [`ValueTransform::apply`].
pub type TransformFailure = EvaluationFailure;

/// A named, schema-validated mapping from one value to another.
///
/// Transforms fail soft: if anything goes wrong the input comes back
/// unchanged and the failure is logged at `warn`.
#[derive(Debug, Clone)]
pub struct ValueTransform {
    integration: String,
    operation_name: String,
    arguments: Vec<Argument>,
    operation: Option<Arc<Operation>>,
    errors: Vec<DefinitionError>,
}

impl ValueTransform {
    /// Look up the transform and validate its arguments. Problems are
    /// recorded in [`errors`](Self::errors), never returned.
    pub fn new(
        registry: &dyn IntegrationRegistry,
        integration: impl Into<String>,
        operation: impl Into<String>,
        arguments: Vec<Argument>,
    ) -> Self {
        let integration = integration.into();
        let operation_name = operation.into();
        let mut errors = Vec::new();

        let operation = match registry.lookup(OperationKind::Transform, &integration, &operation_name)
        {
            Ok(op) => {
                let resolution = resolve(&arguments, &op.schema, None);
                errors.extend(resolution.errors.into_iter().map(DefinitionError::from));
                Some(op)
            }
            Err(err) => {
                errors.push(DefinitionError::from(err));
                None
            }
        };

        Self {
            integration,
            operation_name,
            arguments,
            operation,
            errors,
        }
    }

    pub fn integration(&self) -> &str {
        &self.integration
    }

    pub fn operation(&self) -> &str {
        &self.operation_name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn errors(&self) -> &[DefinitionError] {
        &self.errors
    }

    /// Apply the transform, returning `input` unchanged on any failure.
    pub fn apply(&self, input: &Value, accumulator: &Accumulator) -> Value {
        match self.try_apply(input, accumulator) {
            Ok(output) => output,
            Err(failure) => {
                warn!(
                    integration = %self.integration,
                    transform = %self.operation_name,
                    error = %failure,
                    "transform failed; passing input through unchanged"
                );
                input.clone()
            }
        }
    }

    /// Apply the transform, surfacing the failure instead of swallowing it.
    pub fn try_apply(
        &self,
        input: &Value,
        accumulator: &Accumulator,
    ) -> Result<Value, TransformFailure> {
        let ret = run_operation(
            self.operation.as_ref(),
            &self.integration,
            &self.operation_name,
            &self.arguments,
            input,
            accumulator,
        )?;
        debug!(transform = %self.operation_name, output = %ret.result, "transform applied");
        Ok(ret.result)
    }
}
