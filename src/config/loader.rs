// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawWorkflowConfig, WorkflowConfig};
use crate::errors::Result;

/// Load a workflow file and return the raw, unvalidated definition.
///
/// Use [`load_and_validate`] unless you want to inspect an invalid file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWorkflowConfig = toml::from_str(&contents)?;
    debug!(path = %path.display(), actions = config.actions.len(), "workflow file parsed");

    Ok(config)
}

/// Load a workflow file and check it:
///
/// - at least one action, unique names
/// - every argument sets exactly one of `value` / `reference`
/// - every reference names a declared action
/// - references form no cycle
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowConfig> {
    let raw = load_from_path(&path)?;
    WorkflowConfig::try_from(raw)
}

/// Parse and validate a workflow held in memory.
pub fn parse_workflow(contents: &str) -> Result<WorkflowConfig> {
    let raw: RawWorkflowConfig = toml::from_str(contents)?;
    WorkflowConfig::try_from(raw)
}

/// `Flowgate.toml` in the current directory.
pub fn default_workflow_path() -> PathBuf {
    PathBuf::from("Flowgate.toml")
}
