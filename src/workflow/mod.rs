// src/workflow/mod.rs

//! Thin workflow driver.
//!
//! - [`graph`] keeps which action references which.
//! - [`runner`] builds actions from a validated definition and runs them
//!   sequentially against one accumulator.

pub mod graph;
pub mod runner;

pub use graph::ReferenceGraph;
pub use runner::{ActionReport, Workflow, WorkflowReport, build_expression};
