// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::args::Argument;
use crate::config::model::{RawWorkflowConfig, WorkflowConfig};
use crate::errors::{FlowgateError, Result};

impl TryFrom<RawWorkflowConfig> for WorkflowConfig {
    type Error = FlowgateError;

    fn try_from(raw: RawWorkflowConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(WorkflowConfig::new_unchecked(raw.engine, raw.actions))
    }
}

fn validate_raw_config(cfg: &RawWorkflowConfig) -> Result<()> {
    ensure_has_actions(cfg)?;
    validate_unique_names(cfg)?;
    validate_arguments(cfg)?;
    validate_references(cfg)?;
    validate_reference_graph(cfg)?;
    Ok(())
}

fn ensure_has_actions(cfg: &RawWorkflowConfig) -> Result<()> {
    if cfg.actions.is_empty() {
        return Err(FlowgateError::ConfigError(
            "workflow must contain at least one [[action]] table".to_string(),
        ));
    }
    Ok(())
}

fn validate_unique_names(cfg: &RawWorkflowConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for action in &cfg.actions {
        if action.name.trim().is_empty() {
            return Err(FlowgateError::ConfigError(
                "action name must not be empty".to_string(),
            ));
        }
        if !seen.insert(action.name.as_str()) {
            return Err(FlowgateError::ConfigError(format!(
                "action name '{}' is declared more than once",
                action.name
            )));
        }
    }
    Ok(())
}

fn validate_arguments(cfg: &RawWorkflowConfig) -> Result<()> {
    for action in &cfg.actions {
        for arg in &action.arguments {
            ensure_well_formed(&action.name, "arguments", arg)?;
        }
        if let Some(trigger) = &action.trigger {
            for (location, arg) in trigger.arguments() {
                ensure_well_formed(&action.name, &location, arg)?;
            }
        }
    }
    Ok(())
}

fn ensure_well_formed(action: &str, location: &str, arg: &Argument) -> Result<()> {
    if !arg.is_well_formed() {
        return Err(FlowgateError::ConfigError(format!(
            "action '{action}': argument '{}' in {location} must set exactly one of `value` or `reference`",
            arg.name
        )));
    }
    Ok(())
}

fn validate_references(cfg: &RawWorkflowConfig) -> Result<()> {
    let names: HashSet<&str> = cfg.actions.iter().map(|a| a.name.as_str()).collect();

    for action in &cfg.actions {
        for arg in &action.arguments {
            let Some(reference) = arg.reference.as_deref() else {
                continue;
            };
            if !names.contains(reference) {
                return Err(FlowgateError::ConfigError(format!(
                    "action '{}' has unknown reference '{}' in argument '{}'",
                    action.name, reference, arg.name
                )));
            }
            // A triggered action records the accepted data under its own name.
            if reference == action.name && action.trigger.is_none() {
                return Err(FlowgateError::ConfigError(format!(
                    "action '{}' cannot reference itself without a trigger",
                    action.name
                )));
            }
        }

        if let Some(trigger) = &action.trigger {
            for reference in trigger.references() {
                if !names.contains(reference) {
                    return Err(FlowgateError::ConfigError(format!(
                        "trigger of action '{}' has unknown reference '{}'",
                        action.name, reference
                    )));
                }
                if reference == action.name {
                    return Err(FlowgateError::ConfigError(format!(
                        "trigger of action '{}' cannot reference the action itself",
                        action.name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_reference_graph(cfg: &RawWorkflowConfig) -> Result<()> {
    // Edge direction: referenced -> referencing.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for action in &cfg.actions {
        graph.add_node(action.name.as_str());
    }

    for action in &cfg.actions {
        for reference in action.references() {
            if reference != action.name {
                graph.add_edge(reference, action.name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(FlowgateError::ReferenceCycle(format!(
            "cycle in argument references involving action '{}'",
            cycle.node_id()
        ))),
    }
}
