// src/integration/mod.rs

//! Integrations as seen by the engine.
//!
//! - `schema`: declared parameters, input type and device binding of a callable.
//! - `registry`: lookup of callables by `(kind, integration, operation)`.
//! - `instance`: device instances and their context-scoped fields.
//! - `builtin`: the `Utilities` integration used by the CLI.

pub mod builtin;
pub mod instance;
pub mod registry;
pub mod schema;

pub use instance::{AppInstance, ContextKey, ContextStore, InMemoryContextStore, InstanceRepo};
pub use registry::{
    CallError, InMemoryRegistry, IntegrationRegistry, Invocation, LookupError, Operation,
    OperationKind, OperationReturn,
};
pub use schema::{OperationSchema, ParameterSpec, ParameterType};
