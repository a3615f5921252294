// src/workflow/runner.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::condition::{Condition, ConditionExpression, ValueTransform};
use crate::config::model::{ConditionConfig, ExpressionConfig, WorkflowConfig};
use crate::engine::{Accumulator, Action, ActionResult, ResultStatus, TriggerData};
use crate::errors::{DefinitionError, FlowgateError, Result};
use crate::integration::{ContextStore, InMemoryContextStore, InstanceRepo, IntegrationRegistry};
use crate::signal::SignalBus;
use crate::workflow::graph::ReferenceGraph;

/// Outcome of one action inside a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub action: String,
    pub execution_id: Option<Uuid>,
    #[serde(flatten)]
    pub result: ActionResult,
}

/// Outcome of [`Workflow::execute`].
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub execution_id: Uuid,
    pub results: Vec<ActionReport>,
    pub cancelled: bool,
    pub accumulator: Accumulator,
}

impl WorkflowReport {
    pub fn result_of(&self, action: &str) -> Option<&ActionResult> {
        self.results
            .iter()
            .find(|r| r.action == action)
            .map(|r| &r.result)
    }
}

/// A set of actions run sequentially against one accumulator.
///
/// Actions run dependencies first (by argument and trigger references),
/// otherwise in declaration order. A triggered action blocks the run until
/// [`send_data_to_trigger`](Workflow::send_data_to_trigger) delivers data it
/// accepts, or until [`cancel_all`](Workflow::cancel_all) is called; the run
/// stops after a cancelled action.
#[derive(Debug)]
pub struct Workflow {
    actions: Vec<Action>,
    store: Arc<dyn ContextStore>,
    cancelled: AtomicBool,
}

impl Workflow {
    /// Construct every action of a validated workflow.
    pub fn from_config(
        cfg: &WorkflowConfig,
        registry: &dyn IntegrationRegistry,
        bus: Arc<SignalBus>,
    ) -> Result<Self> {
        let graph = ReferenceGraph::from_config(cfg);

        let mut actions = Vec::with_capacity(cfg.actions.len());
        for name in graph.execution_order() {
            let action_cfg = cfg
                .action(&name)
                .ok_or_else(|| FlowgateError::ActionNotFound(name.clone()))?;

            let mut builder = Action::builder(
                &action_cfg.name,
                &action_cfg.integration,
                &action_cfg.operation,
            )
            .arguments(action_cfg.arguments.iter().cloned());

            if let Some(id) = action_cfg.id {
                builder = builder.id(id);
            }
            if let Some(device) = &action_cfg.device {
                builder = builder.device(device);
            }
            if let Some(position) = action_cfg.position {
                builder = builder.position(position);
            }
            if let Some(trigger) = &action_cfg.trigger {
                builder = builder.trigger(build_expression(trigger, registry));
            }

            actions.push(builder.build(registry, Arc::clone(&bus))?);
        }

        debug!(actions = actions.len(), "workflow constructed");

        Ok(Self {
            actions,
            store: Arc::new(InMemoryContextStore::new()),
            cancelled: AtomicBool::new(false),
        })
    }

    /// Replace the default in-memory context store.
    pub fn with_context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = store;
        self
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn action_by_id(&self, id: Uuid) -> Option<&Action> {
        self.actions.iter().find(|a| a.id() == id)
    }

    /// Actions in execution order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn execution_order(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// Construction-time problems, per action name.
    pub fn definition_errors(&self) -> Vec<(&str, &DefinitionError)> {
        self.actions
            .iter()
            .flat_map(|a| a.all_errors().into_iter().map(move |e| (a.name(), e)))
            .collect()
    }

    /// Route trigger data to the named action. Safe to call before or while
    /// the action waits.
    pub fn send_data_to_trigger(&self, action: &str, data: TriggerData) -> Result<()> {
        let target = self
            .action(action)
            .ok_or_else(|| FlowgateError::ActionNotFound(action.to_string()))?;
        route_to_trigger(target, data)
    }

    /// Same as [`send_data_to_trigger`](Workflow::send_data_to_trigger), addressed by
    /// the action's stable identity.
    pub fn deliver(&self, action_id: Uuid, data: TriggerData) -> Result<()> {
        let target = self
            .action_by_id(action_id)
            .ok_or_else(|| FlowgateError::ActionNotFound(action_id.to_string()))?;
        route_to_trigger(target, data)
    }

    /// Stop the run: wake every waiting trigger with a cancellation and skip
    /// the actions that have not started.
    pub fn cancel_all(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        for action in &self.actions {
            action.cancel_trigger();
        }
        info!("workflow cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run every action once, in execution order.
    pub fn execute(&self, accumulator: Accumulator) -> WorkflowReport {
        let execution_id = Uuid::new_v4();
        let instances = InstanceRepo::new(execution_id, Arc::clone(&self.store));
        let mut accumulator = accumulator;
        let mut results = Vec::with_capacity(self.actions.len());
        let mut cancelled = false;

        info!(%execution_id, actions = self.actions.len(), "workflow execution started");

        for action in &self.actions {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            let instance = match (action.is_device_bound(), action.device_id()) {
                (true, Some(device)) => Some(instances.get_or_create(action.integration(), device)),
                _ => None,
            };

            let result = action.execute(&mut accumulator, None, instance.as_deref());
            let stop = result.status == ResultStatus::Cancelled;
            results.push(ActionReport {
                action: action.name().to_string(),
                execution_id: action.execution_id(),
                result,
            });

            if stop {
                cancelled = true;
                break;
            }
        }

        instances.shutdown();
        info!(%execution_id, executed = results.len(), cancelled, "workflow execution finished");

        WorkflowReport {
            execution_id,
            results,
            cancelled,
            accumulator,
        }
    }
}

/// Queue `data` on the action's gate; refused when the action has no trigger.
fn route_to_trigger(target: &Action, data: TriggerData) -> Result<()> {
    if target.trigger().is_none() {
        warn!(action = target.name(), "refusing data for an action without a trigger");
        return Err(FlowgateError::NoTrigger(target.name().to_string()));
    }
    target.send_data_to_trigger(data);
    Ok(())
}

/// Build a trigger expression: leaf conditions first, then nested children.
pub fn build_expression(
    cfg: &ExpressionConfig,
    registry: &dyn IntegrationRegistry,
) -> ConditionExpression {
    let children = cfg
        .conditions
        .iter()
        .map(|c| ConditionExpression::Leaf(build_condition(c, registry)))
        .chain(cfg.children.iter().map(|c| build_expression(c, registry)))
        .collect();

    ConditionExpression::Node {
        operator: cfg.operator,
        negated: cfg.negated,
        children,
    }
}

fn build_condition(cfg: &ConditionConfig, registry: &dyn IntegrationRegistry) -> Condition {
    let transforms = cfg.transforms.iter().map(|t| {
        ValueTransform::new(
            registry,
            &t.integration,
            &t.operation,
            t.arguments.clone(),
        )
    });

    Condition::new(registry, &cfg.integration, &cfg.operation, cfg.arguments.clone())
        .with_transforms(transforms)
        .negated(cfg.negated)
}
