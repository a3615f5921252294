// src/workflow/graph.rs

use std::collections::{HashMap, HashSet};

use crate::config::model::WorkflowConfig;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct ReferenceNode {
    /// Actions whose results this one references.
    deps: Vec<String>,
    /// Actions that reference this one.
    dependents: Vec<String>,
}

/// Which actions reference which, keyed by action name.
///
/// Acyclicity is checked in `config::validate`; this only keeps adjacency
/// and the declaration order used to break ties.
#[derive(Debug, Clone)]
pub struct ReferenceGraph {
    order: Vec<String>,
    nodes: HashMap<String, ReferenceNode>,
}

impl ReferenceGraph {
    /// Build from a validated [`WorkflowConfig`]. Self-references are
    /// ignored.
    pub fn from_config(cfg: &WorkflowConfig) -> Self {
        let order: Vec<String> = cfg.actions.iter().map(|a| a.name.clone()).collect();
        let mut nodes: HashMap<String, ReferenceNode> = order
            .iter()
            .map(|name| (name.clone(), ReferenceNode::default()))
            .collect();

        for action in &cfg.actions {
            let mut seen = HashSet::new();
            for reference in action.references() {
                if reference == action.name || !seen.insert(reference) {
                    continue;
                }
                if let Some(node) = nodes.get_mut(&action.name) {
                    node.deps.push(reference.to_string());
                }
                if let Some(node) = nodes.get_mut(reference) {
                    node.dependents.push(action.name.clone());
                }
            }
        }

        Self { order, nodes }
    }

    /// Action names in declaration order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Dependencies first; otherwise declaration order.
    ///
    /// Each step takes the earliest-declared action whose dependencies have
    /// all been placed. Actions stuck behind a cycle are appended at the end
    /// in declaration order.
    pub fn execution_order(&self) -> Vec<String> {
        let mut placed: HashSet<&str> = HashSet::new();
        let mut out = Vec::with_capacity(self.order.len());

        while out.len() < self.order.len() {
            let next = self.order.iter().find(|name| {
                !placed.contains(name.as_str())
                    && self
                        .dependencies_of(name)
                        .iter()
                        .all(|dep| placed.contains(dep.as_str()))
            });

            match next {
                Some(name) => {
                    placed.insert(name.as_str());
                    out.push(name.clone());
                }
                None => {
                    out.extend(
                        self.order
                            .iter()
                            .filter(|name| !placed.contains(name.as_str()))
                            .cloned(),
                    );
                    break;
                }
            }
        }

        out
    }
}
