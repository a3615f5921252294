// src/engine/action.rs

//! The action invoker.
//!
//! `Action::execute` drives one execution through
//! `Created -> [Awaiting] -> Running -> terminal`, emitting a signal at each
//! transition. Every call ends with exactly one stored [`ActionResult`] and
//! exactly one terminal signal (`ActionExecutionSuccess`,
//! `ActionExecutionError` or `ActionArgumentsInvalid`); integration failures
//! and panics are converted into results and never escape.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::args::{Argument, join_errors, merge_overrides, resolve};
use crate::condition::ConditionExpression;
use crate::engine::accumulator::Accumulator;
use crate::engine::result::{ActionResult, ResultStatus};
use crate::engine::trigger::{GateOutcome, GatePhase, TriggerData, TriggerGate};
use crate::errors::{DefinitionError, FlowgateError, Result};
use crate::exec::{ExecutionStrategy, LocalExecutionStrategy};
use crate::integration::{
    AppInstance, CallError, IntegrationRegistry, Invocation, Operation, OperationKind,
};
use crate::signal::{Emitter, SignalBus, SignalKind};
use crate::types::Position;

/// Where an action is in its current (or last) execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Created,
    Awaiting,
    Running,
    Succeeded,
    ArgumentsInvalid,
    ExecutionError,
    Cancelled,
}

#[derive(Debug)]
struct ExecutionState {
    execution_id: Option<Uuid>,
    output: Option<ActionResult>,
    phase: ActionPhase,
}

/// One unit of work bound to an integration operation.
///
/// Built with [`Action::builder`]. Construction looks the operation up and
/// validates the declared arguments; problems are kept in
/// [`errors`](Action::errors) and only become fatal when the action runs.
#[derive(Debug)]
pub struct Action {
    id: Uuid,
    name: String,
    integration: String,
    operation_name: String,
    device_id: Option<String>,
    arguments: Vec<Argument>,
    trigger: Option<ConditionExpression>,
    position: Option<Position>,
    errors: Vec<DefinitionError>,
    operation: Option<Arc<Operation>>,
    bus: Arc<SignalBus>,
    strategy: Arc<dyn ExecutionStrategy>,
    gate: Arc<TriggerGate>,
    state: Mutex<ExecutionState>,
}

/// Builder for [`Action`].
#[derive(Debug)]
pub struct ActionBuilder {
    id: Option<Uuid>,
    name: String,
    integration: String,
    operation: String,
    device_id: Option<String>,
    arguments: Vec<Argument>,
    trigger: Option<ConditionExpression>,
    position: Option<Position>,
    strategy: Option<Arc<dyn ExecutionStrategy>>,
}

impl ActionBuilder {
    pub fn new(
        name: impl Into<String>,
        integration: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            integration: integration.into(),
            operation: operation.into(),
            device_id: None,
            arguments: Vec::new(),
            trigger: None,
            position: None,
            strategy: None,
        }
    }

    /// Reuse a persisted identity instead of generating one.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn arguments(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn trigger(mut self, trigger: ConditionExpression) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Resolve the operation and validate arguments.
    ///
    /// Fails only when the operation is device-bound and no device was given;
    /// an unknown operation or bad arguments are recorded on the action.
    pub fn build(self, registry: &dyn IntegrationRegistry, bus: Arc<SignalBus>) -> Result<Action> {
        let mut errors = Vec::new();

        let operation =
            match registry.lookup(OperationKind::Action, &self.integration, &self.operation) {
                Ok(op) => {
                    let has_device = self.device_id.as_deref().is_some_and(|d| !d.is_empty());
                    if op.schema.device_bound && !has_device {
                        return Err(FlowgateError::DeviceRequired {
                            action: self.name,
                            integration: self.integration,
                            operation: self.operation,
                        });
                    }
                    let resolution = resolve(&self.arguments, &op.schema, None);
                    errors.extend(resolution.errors.into_iter().map(DefinitionError::from));
                    Some(op)
                }
                Err(err) => {
                    errors.push(DefinitionError::from(err));
                    None
                }
            };

        if !errors.is_empty() {
            warn!(
                action = %self.name,
                errors = errors.len(),
                "action constructed with validation errors"
            );
        }

        Ok(Action {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            integration: self.integration,
            operation_name: self.operation,
            device_id: self.device_id,
            arguments: self.arguments,
            trigger: self.trigger,
            position: self.position,
            errors,
            operation,
            bus,
            strategy: self
                .strategy
                .unwrap_or_else(|| Arc::new(LocalExecutionStrategy)),
            gate: Arc::new(TriggerGate::new()),
            state: Mutex::new(ExecutionState {
                execution_id: None,
                output: None,
                phase: ActionPhase::Created,
            }),
        })
    }
}

impl Action {
    pub fn builder(
        name: impl Into<String>,
        integration: impl Into<String>,
        operation: impl Into<String>,
    ) -> ActionBuilder {
        ActionBuilder::new(name, integration, operation)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn integration(&self) -> &str {
        &self.integration
    }

    pub fn operation(&self) -> &str {
        &self.operation_name
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn trigger(&self) -> Option<&ConditionExpression> {
        self.trigger.as_ref()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn is_device_bound(&self) -> bool {
        self.operation
            .as_ref()
            .is_some_and(|op| op.schema.device_bound)
    }

    /// Construction-time validation errors of the action itself.
    pub fn errors(&self) -> &[DefinitionError] {
        &self.errors
    }

    /// Own errors plus those of the trigger's conditions and transforms.
    pub fn all_errors(&self) -> Vec<&DefinitionError> {
        let mut all: Vec<&DefinitionError> = self.errors.iter().collect();
        if let Some(trigger) = &self.trigger {
            all.extend(trigger.errors());
        }
        all
    }

    /// Correlation id of the current or last execution.
    pub fn execution_id(&self) -> Option<Uuid> {
        self.lock().execution_id
    }

    /// Result of the last execution; `None` before the first one.
    pub fn get_output(&self) -> Option<ActionResult> {
        self.lock().output.clone()
    }

    pub fn phase(&self) -> ActionPhase {
        self.lock().phase
    }

    pub fn trigger_phase(&self) -> GatePhase {
        self.gate.phase()
    }

    /// Handle for delivering data from another thread while `execute` blocks.
    pub fn trigger_handle(&self) -> Arc<TriggerGate> {
        Arc::clone(&self.gate)
    }

    pub fn send_data_to_trigger(&self, data: TriggerData) {
        self.gate.deliver(data);
    }

    pub fn cancel_trigger(&self) {
        self.gate.cancel();
    }

    fn lock(&self) -> MutexGuard<'_, ExecutionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: ActionPhase) {
        self.lock().phase = phase;
    }

    /// Run the action once.
    ///
    /// `overrides`, when given, replace the declared arguments for this call.
    /// `instance` is handed to device-bound operations.
    pub fn execute(
        &self,
        accumulator: &mut Accumulator,
        overrides: Option<&[Argument]>,
        instance: Option<&AppInstance>,
    ) -> ActionResult {
        let execution_id = Uuid::new_v4();
        {
            let mut state = self.lock();
            state.execution_id = Some(execution_id);
            state.phase = ActionPhase::Created;
        }
        self.gate.reset();

        let emitter = Emitter::new(&self.bus, self.id, &self.name, execution_id);
        info!(action = %self.name, %execution_id, "executing action");
        emitter.emit(SignalKind::ActionStarted);

        let mut arguments = match overrides {
            Some(args) if !args.is_empty() => args.to_vec(),
            _ => self.arguments.clone(),
        };

        if let Some(trigger) = &self.trigger {
            self.set_phase(ActionPhase::Awaiting);
            debug!(action = %self.name, "trigger awaiting data");

            match self.gate.await_acceptance(trigger, accumulator, &emitter) {
                GateOutcome::Accepted(data) => {
                    accumulator.insert(self.name.clone(), data.data_in.clone());
                    arguments = merge_overrides(&arguments, &data.arguments);
                    emitter.emit_with(SignalKind::TriggerTaken, data.data_in);
                }
                GateOutcome::Cancelled => {
                    let result = ActionResult::error(
                        ResultStatus::Cancelled,
                        "trigger wait was cancelled",
                    );
                    return self.finish(&emitter, result, ActionPhase::Cancelled);
                }
            }
        }

        self.set_phase(ActionPhase::Running);

        let Some(operation) = &self.operation else {
            let message = format!(
                "operation {}/{} is not available",
                self.integration, self.operation_name
            );
            let result = ActionResult::error(ResultStatus::UnhandledException, message);
            return self.finish(&emitter, result, ActionPhase::ExecutionError);
        };

        let resolution = resolve(&arguments, &operation.schema, Some(&*accumulator));
        if !resolution.is_ok() {
            let result = ActionResult::error(
                ResultStatus::InvalidArguments,
                join_errors(&resolution.errors),
            );
            return self.finish(&emitter, result, ActionPhase::ArgumentsInvalid);
        }
        let values = resolution.values;

        if operation.schema.device_bound && instance.is_none() {
            let message = format!(
                "{}/{} is device-bound but no instance was provided",
                self.integration, self.operation_name
            );
            let result = ActionResult::error(ResultStatus::UnhandledException, message);
            return self.finish(&emitter, result, ActionPhase::ExecutionError);
        }

        let invocation = Invocation::new(&values).with_instance(instance);
        let returned = match self.strategy.execute(operation, &invocation) {
            Ok(returned) => returned,
            Err(CallError::InvalidArguments(message)) => {
                let result = ActionResult::error(ResultStatus::InvalidArguments, message);
                return self.finish(&emitter, result, ActionPhase::ArgumentsInvalid);
            }
            Err(err) => {
                error!(action = %self.name, error = %err, "integration call failed");
                let message = format!("{}: {err}", unhandled_kind(&err));
                let result = ActionResult::error(ResultStatus::UnhandledException, message);
                return self.finish(&emitter, result, ActionPhase::ExecutionError);
            }
        };

        let status = returned
            .status
            .unwrap_or_else(|| ResultStatus::Success.as_str().to_string());
        let failed = operation.schema.is_failure_status(&status);
        let result = ActionResult::new(returned.result, ResultStatus::from(status));

        if failed {
            self.finish(&emitter, result, ActionPhase::ExecutionError)
        } else {
            accumulator.insert(self.name.clone(), result.result.clone());
            self.finish(&emitter, result, ActionPhase::Succeeded)
        }
    }

    /// Emit the terminal signal, store the result and return it.
    fn finish(&self, emitter: &Emitter<'_>, result: ActionResult, phase: ActionPhase) -> ActionResult {
        let kind = match phase {
            ActionPhase::Succeeded => SignalKind::ActionExecutionSuccess,
            ActionPhase::ArgumentsInvalid => SignalKind::ActionArgumentsInvalid,
            _ => SignalKind::ActionExecutionError,
        };

        match phase {
            ActionPhase::Succeeded => info!(action = %self.name, status = %result.status, "action succeeded"),
            _ => warn!(
                action = %self.name,
                status = %result.status,
                message = result.message.as_deref().unwrap_or(""),
                "action did not succeed"
            ),
        }

        emitter.emit_with(kind, result.to_json());

        let mut state = self.lock();
        state.phase = phase;
        state.output = Some(result.clone());
        result
    }
}

fn unhandled_kind(err: &CallError) -> &'static str {
    match err {
        CallError::InvalidArguments(_) => "InvalidArguments",
        CallError::Failed(_) => "Failed",
        CallError::Panicked(_) => "Panic",
        CallError::Other(_) => "Error",
    }
}
