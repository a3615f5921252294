// src/integration/registry.rs

//! Lookup of integration operations by `(kind, integration, operation)`.
//!
//! The registry is the only place the engine learns about callables; it
//! never introspects an integration's implementation. Each [`Operation`]
//! pairs an explicit [`OperationSchema`] with a handler closure.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::integration::instance::AppInstance;
use crate::integration::schema::OperationSchema;

/// What role a callable plays in a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Action,
    Condition,
    Transform,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Action => "action",
            OperationKind::Condition => "condition",
            OperationKind::Transform => "transform",
        };
        f.write_str(s)
    }
}

/// Failure reported by (or caught around) an integration callable.
#[derive(Error, Debug)]
pub enum CallError {
    /// The callable rejected its arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),

    #[error("callable panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Raised when an `(integration, operation)` pair cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown integration '{integration}'")]
    UnknownIntegration { integration: String },

    #[error("integration '{integration}' has no {kind} named '{operation}'")]
    UnknownOperation {
        integration: String,
        operation: String,
        kind: OperationKind,
    },
}

/// Everything a callable receives for one call.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Resolved, coerced arguments keyed by parameter name.
    pub arguments: &'a Map<String, Value>,
    /// Data input (conditions and transforms).
    pub input: Option<&'a Value>,
    /// Bound device instance (device-bound actions).
    pub instance: Option<&'a AppInstance>,
}

impl<'a> Invocation<'a> {
    pub fn new(arguments: &'a Map<String, Value>) -> Self {
        Self {
            arguments,
            input: None,
            instance: None,
        }
    }

    pub fn with_input(mut self, input: &'a Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_instance(mut self, instance: Option<&'a AppInstance>) -> Self {
        self.instance = instance;
        self
    }

    pub fn arg(&self, name: &str) -> Result<&'a Value, CallError> {
        self.arguments
            .get(name)
            .ok_or_else(|| CallError::InvalidArguments(format!("missing argument '{name}'")))
    }

    pub fn number(&self, name: &str) -> Result<f64, CallError> {
        self.arg(name)?
            .as_f64()
            .ok_or_else(|| CallError::InvalidArguments(format!("argument '{name}' is not a number")))
    }

    pub fn string(&self, name: &str) -> Result<&'a str, CallError> {
        self.arg(name)?
            .as_str()
            .ok_or_else(|| CallError::InvalidArguments(format!("argument '{name}' is not a string")))
    }

    pub fn data(&self) -> Result<&'a Value, CallError> {
        self.input
            .ok_or_else(|| CallError::InvalidArguments("missing data input".to_string()))
    }

    pub fn data_number(&self) -> Result<f64, CallError> {
        self.data()?
            .as_f64()
            .ok_or_else(|| CallError::InvalidArguments("data input is not a number".to_string()))
    }

    pub fn data_str(&self) -> Result<&'a str, CallError> {
        self.data()?
            .as_str()
            .ok_or_else(|| CallError::InvalidArguments("data input is not a string".to_string()))
    }

    pub fn instance(&self) -> Result<&'a AppInstance, CallError> {
        self.instance
            .ok_or_else(|| CallError::Failed("no device instance bound".to_string()))
    }
}

/// What a callable hands back: a payload and, optionally, an explicit status.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReturn {
    pub result: Value,
    pub status: Option<String>,
}

impl OperationReturn {
    pub fn new(result: Value) -> Self {
        Self {
            result,
            status: None,
        }
    }

    pub fn with_status(result: Value, status: impl Into<String>) -> Self {
        Self {
            result,
            status: Some(status.into()),
        }
    }
}

impl From<Value> for OperationReturn {
    fn from(result: Value) -> Self {
        Self::new(result)
    }
}

pub type Handler =
    Arc<dyn Fn(&Invocation<'_>) -> Result<OperationReturn, CallError> + Send + Sync>;

/// A callable plus its declared contract.
#[derive(Clone)]
pub struct Operation {
    pub integration: String,
    pub name: String,
    pub kind: OperationKind,
    pub schema: OperationSchema,
    handler: Handler,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("integration", &self.integration)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Operation {
    pub fn new<F>(
        kind: OperationKind,
        integration: impl Into<String>,
        name: impl Into<String>,
        schema: OperationSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<OperationReturn, CallError> + Send + Sync + 'static,
    {
        Self {
            integration: integration.into(),
            name: name.into(),
            kind,
            schema,
            handler: Arc::new(handler),
        }
    }

    pub fn action<F>(
        integration: impl Into<String>,
        name: impl Into<String>,
        schema: OperationSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<OperationReturn, CallError> + Send + Sync + 'static,
    {
        Self::new(OperationKind::Action, integration, name, schema, handler)
    }

    /// A predicate; the handler's boolean becomes the returned payload.
    pub fn condition<F>(
        integration: impl Into<String>,
        name: impl Into<String>,
        schema: OperationSchema,
        predicate: F,
    ) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<bool, CallError> + Send + Sync + 'static,
    {
        Self::new(
            OperationKind::Condition,
            integration,
            name,
            schema,
            move |inv: &Invocation<'_>| predicate(inv).map(|b| OperationReturn::new(Value::Bool(b))),
        )
    }

    pub fn transform<F>(
        integration: impl Into<String>,
        name: impl Into<String>,
        schema: OperationSchema,
        transform: F,
    ) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self::new(
            OperationKind::Transform,
            integration,
            name,
            schema,
            move |inv: &Invocation<'_>| transform(inv).map(OperationReturn::new),
        )
    }

    /// Call the handler directly. Panics are not caught here; see
    /// [`crate::exec::invoke_guarded`].
    pub fn call(&self, invocation: &Invocation<'_>) -> Result<OperationReturn, CallError> {
        (self.handler)(invocation)
    }
}

/// Source of operations for actions, conditions and transforms.
pub trait IntegrationRegistry: Send + Sync + fmt::Debug {
    fn lookup(
        &self,
        kind: OperationKind,
        integration: &str,
        operation: &str,
    ) -> Result<Arc<Operation>, LookupError>;
}

type OperationKey = (OperationKind, String, String);

/// Registry backed by a plain map, filled at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    integrations: BTreeSet<String>,
    operations: HashMap<OperationKey, Arc<Operation>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an operation.
    pub fn register(&mut self, operation: Operation) -> &mut Self {
        let key = (
            operation.kind,
            operation.integration.clone(),
            operation.name.clone(),
        );
        self.integrations.insert(operation.integration.clone());
        self.operations.insert(key, Arc::new(operation));
        self
    }

    pub fn with(mut self, operation: Operation) -> Self {
        self.register(operation);
        self
    }

    /// Copy every operation of `other` into this registry.
    pub fn merge(mut self, other: InMemoryRegistry) -> Self {
        self.integrations.extend(other.integrations);
        self.operations.extend(other.operations);
        self
    }

    pub fn integrations(&self) -> impl Iterator<Item = &str> {
        self.integrations.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl IntegrationRegistry for InMemoryRegistry {
    fn lookup(
        &self,
        kind: OperationKind,
        integration: &str,
        operation: &str,
    ) -> Result<Arc<Operation>, LookupError> {
        if !self.integrations.contains(integration) {
            return Err(LookupError::UnknownIntegration {
                integration: integration.to_string(),
            });
        }

        self.operations
            .get(&(kind, integration.to_string(), operation.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::UnknownOperation {
                integration: integration.to_string(),
                operation: operation.to_string(),
                kind,
            })
    }
}
