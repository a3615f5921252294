// src/config/model.rs

use serde::Deserialize;
use uuid::Uuid;

use crate::args::Argument;
use crate::types::{LogicalOperator, Position};

/// Workflow definition as read from a TOML file.
///
/// ```toml
/// [engine]
/// log_level = "debug"
///
/// [[action]]
/// name = "start"
/// integration = "Utilities"
/// operation = "echo"
///
/// [[action.argument]]
/// name = "message"
/// value = "hello"
///
/// [[action]]
/// name = "gated"
/// integration = "Utilities"
/// operation = "add_three"
///
/// [[action.argument]]
/// name = "num1"
/// reference = "gated"
///
/// [action.trigger]
/// operator = "and"
///
/// [[action.trigger.condition]]
/// integration = "Utilities"
/// operation = "greater_than"
/// argument = [{ name = "threshold", value = 10 }]
/// ```
///
/// Only deserialization happens here; see [`WorkflowConfig`] for the
/// validated form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkflowConfig {
    #[serde(default)]
    pub engine: EngineSection,

    /// All `[[action]]` tables, in declaration order.
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionConfig>,
}

/// A workflow definition that passed validation.
///
/// Only constructed through `TryFrom<RawWorkflowConfig>`.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub engine: EngineSection,
    pub actions: Vec<ActionConfig>,
}

impl WorkflowConfig {
    pub(crate) fn new_unchecked(engine: EngineSection, actions: Vec<ActionConfig>) -> Self {
        Self { engine, actions }
    }

    pub fn action(&self, name: &str) -> Option<&ActionConfig> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSection {
    /// Used when neither `--log-level` nor `FLOWGATE_LOG` is set.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// `[[action]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    pub integration: String,
    pub operation: String,

    /// Required when the operation is device-bound.
    #[serde(default)]
    pub device: Option<String>,

    /// Stable identity; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default, rename = "argument")]
    pub arguments: Vec<Argument>,

    #[serde(default)]
    pub trigger: Option<ExpressionConfig>,
}

impl ActionConfig {
    /// Every accumulator key referenced by the action's arguments and by its
    /// trigger's conditions and transforms.
    pub fn references(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .arguments
            .iter()
            .filter_map(|a| a.reference.as_deref())
            .collect();
        if let Some(trigger) = &self.trigger {
            out.extend(trigger.references());
        }
        out
    }
}

/// An expression node: `operator` over its leaf `condition`s followed by its
/// nested `child` expressions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpressionConfig {
    #[serde(default)]
    pub operator: LogicalOperator,

    #[serde(default)]
    pub negated: bool,

    #[serde(default, rename = "condition")]
    pub conditions: Vec<ConditionConfig>,

    #[serde(default, rename = "child")]
    pub children: Vec<ExpressionConfig>,
}

impl ExpressionConfig {
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for condition in &self.conditions {
            out.extend(condition.arguments.iter().filter_map(|a| a.reference.as_deref()));
            for transform in &condition.transforms {
                out.extend(transform.arguments.iter().filter_map(|a| a.reference.as_deref()));
            }
        }
        for child in &self.children {
            out.extend(child.references());
        }
        out
    }

    /// Every argument anywhere in the expression, with a location label.
    pub fn arguments(&self) -> Vec<(String, &Argument)> {
        let mut out = Vec::new();
        for condition in &self.conditions {
            let label = format!("condition {}/{}", condition.integration, condition.operation);
            out.extend(condition.arguments.iter().map(|a| (label.clone(), a)));
            for transform in &condition.transforms {
                let label = format!("transform {}/{}", transform.integration, transform.operation);
                out.extend(transform.arguments.iter().map(|a| (label.clone(), a)));
            }
        }
        for child in &self.children {
            out.extend(child.arguments());
        }
        out
    }
}

/// `[[...condition]]` leaf.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionConfig {
    pub integration: String,
    pub operation: String,

    #[serde(default)]
    pub negated: bool,

    #[serde(default, rename = "argument")]
    pub arguments: Vec<Argument>,

    /// Applied in order to the input before the predicate runs.
    #[serde(default, rename = "transform")]
    pub transforms: Vec<TransformConfig>,
}

/// `[[...transform]]` entry of a condition.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub integration: String,
    pub operation: String,

    #[serde(default, rename = "argument")]
    pub arguments: Vec<Argument>,
}
