// src/condition/condition.rs

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::args::coerce::{describe, parse_bool};
use crate::args::{Argument, resolve};
use crate::condition::transform::ValueTransform;
use crate::condition::{EvaluationFailure, run_operation};
use crate::engine::accumulator::Accumulator;
use crate::errors::DefinitionError;
use crate::integration::{IntegrationRegistry, Operation, OperationKind};

/// One predicate leaf: an integration condition, its arguments, and the
/// transforms applied to the input before the predicate sees it.
#[derive(Debug, Clone)]
pub struct Condition {
    integration: String,
    operation_name: String,
    arguments: Vec<Argument>,
    transforms: Vec<ValueTransform>,
    negated: bool,
    operation: Option<Arc<Operation>>,
    errors: Vec<DefinitionError>,
}

impl Condition {
    pub fn new(
        registry: &dyn IntegrationRegistry,
        integration: impl Into<String>,
        operation: impl Into<String>,
        arguments: Vec<Argument>,
    ) -> Self {
        let integration = integration.into();
        let operation_name = operation.into();
        let mut errors = Vec::new();

        let operation = match registry.lookup(OperationKind::Condition, &integration, &operation_name)
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
            transforms: Vec::new(),
            negated: false,
            operation,
            errors,
        }
    }

    pub fn with_transform(mut self, transform: ValueTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn with_transforms(mut self, transforms: impl IntoIterator<Item = ValueTransform>) -> Self {
        self.transforms.extend(transforms);
        self
    }

    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    pub fn integration(&self) -> &str {
        &self.integration
    }

    pub fn operation(&self) -> &str {
        &self.operation_name
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn transforms(&self) -> &[ValueTransform] {
        &self.transforms
    }

    /// Construction problems of this condition and of its transforms.
    pub fn errors(&self) -> Vec<&DefinitionError> {
        self.errors
            .iter()
            .chain(self.transforms.iter().flat_map(|t| t.errors()))
            .collect()
    }

    /// Evaluate against `input`. A predicate that cannot run, or fails while
    /// running, is `false` whether or not the condition is negated.
    pub fn evaluate(&self, input: &Value, accumulator: &Accumulator) -> bool {
        match self.try_evaluate(input, accumulator) {
            Ok(outcome) => {
                let outcome = outcome != self.negated;
                debug!(
                    condition = %self.operation_name,
                    negated = self.negated,
                    outcome,
                    "condition evaluated"
                );
                outcome
            }
            Err(failure) => {
                warn!(
                    integration = %self.integration,
                    condition = %self.operation_name,
                    error = %failure,
                    "condition failed; treating as false"
                );
                false
            }
        }
    }

    /// Raw predicate outcome, before negation.
    pub fn try_evaluate(
        &self,
        input: &Value,
        accumulator: &Accumulator,
    ) -> Result<bool, EvaluationFailure> {
        let data = self
            .transforms
            .iter()
            .fold(input.clone(), |value, t| t.apply(&value, accumulator));

        let ret = run_operation(
            self.operation.as_ref(),
            &self.integration,
            &self.operation_name,
            &self.arguments,
            &data,
            accumulator,
        )?;

        match &ret.result {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => parse_bool(s).ok_or_else(|| not_boolean(&ret.result)),
            other => Err(not_boolean(other)),
        }
    }
}

fn not_boolean(value: &Value) -> EvaluationFailure {
    EvaluationFailure::NotBoolean(describe(value))
}
