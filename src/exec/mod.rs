// src/exec/mod.rs

//! Invocation layer.
//!
//! - [`strategy`] provides the `ExecutionStrategy` trait, the default
//!   `LocalExecutionStrategy`, and the panic-catching `invoke_guarded` call
//!   used for every integration callable.

pub mod strategy;

pub use strategy::{ExecutionStrategy, LocalExecutionStrategy, invoke_guarded};
