// src/config/mod.rs

//! Workflow definition loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workflow file from disk (`loader.rs`).
//! - Validate names, argument shape and the reference graph (`validate.rs`).
//!
//! The engine itself never reads files; this is the loader the CLI and tests
//! use to hand it fully constructed definitions.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_workflow_path, load_and_validate, load_from_path, parse_workflow};
pub use model::{
    ActionConfig, ConditionConfig, EngineSection, ExpressionConfig, RawWorkflowConfig,
    TransformConfig, WorkflowConfig,
};
