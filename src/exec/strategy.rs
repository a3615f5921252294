// src/exec/strategy.rs

//! Pluggable invocation boundary between the engine and integrations.
//!
//! Actions never call an [`Operation`] directly; they go through an
//! `ExecutionStrategy`. This keeps panics contained at one place and lets
//! tests (or a future remote executor) swap in their own implementation.
//!
//! - [`LocalExecutionStrategy`] runs the callable on the calling thread.
//! - [`invoke_guarded`] is the panic-catching call shared by actions,
//!   conditions and transforms.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::trace;

use crate::integration::{CallError, Invocation, Operation, OperationReturn};

/// How an action's integration callable gets executed.
pub trait ExecutionStrategy: Send + Sync + fmt::Debug {
    fn execute(
        &self,
        operation: &Operation,
        invocation: &Invocation<'_>,
    ) -> Result<OperationReturn, CallError>;
}

/// Default strategy: call in-process, on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutionStrategy;

impl ExecutionStrategy for LocalExecutionStrategy {
    fn execute(
        &self,
        operation: &Operation,
        invocation: &Invocation<'_>,
    ) -> Result<OperationReturn, CallError> {
        invoke_guarded(operation, invocation)
    }
}

/// Call `operation`, turning a panic into [`CallError::Panicked`].
pub fn invoke_guarded(
    operation: &Operation,
    invocation: &Invocation<'_>,
) -> Result<OperationReturn, CallError> {
    trace!(
        integration = %operation.integration,
        operation = %operation.name,
        kind = %operation.kind,
        "invoking operation"
    );

    match panic::catch_unwind(AssertUnwindSafe(|| operation.call(invocation))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(CallError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
