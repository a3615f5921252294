// src/integration/instance.rs

//! Device instances handed to device-bound operations, and the
//! context-scoped key-value store backing their per-execution fields.
//!
//! Fields are keyed by `(execution_id, integration, device_id, field)` so two
//! workflow executions never observe each other's state, and a finished
//! execution can be dropped wholesale with [`ContextStore::clear_execution`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub execution_id: Uuid,
    pub integration: String,
    pub device_id: String,
    pub field: String,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.execution_id, self.integration, self.device_id, self.field
        )
    }
}

/// Narrow get/set interface over whatever cache holds instance fields.
pub trait ContextStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &ContextKey) -> Option<Value>;

    fn set(&self, key: ContextKey, value: Value);

    /// Drop every field recorded under `execution_id`; returns how many went.
    fn clear_execution(&self, execution_id: Uuid) -> usize;
}

/// Process-local [`ContextStore`].
#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    values: Mutex<HashMap<ContextKey, Value>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContextStore for InMemoryContextStore {
    fn get(&self, key: &ContextKey) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: ContextKey, value: Value) {
        debug!(key = %key, "context store set");
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    fn clear_execution(&self, execution_id: Uuid) -> usize {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let before = values.len();
        values.retain(|k, _| k.execution_id != execution_id);
        let removed = before - values.len();
        if removed > 0 {
            debug!(%execution_id, removed, "cleared context for execution");
        }
        removed
    }
}

/// One integration bound to one device for one workflow execution.
#[derive(Debug, Clone)]
pub struct AppInstance {
    integration: String,
    device_id: String,
    execution_id: Uuid,
    store: Arc<dyn ContextStore>,
}

impl AppInstance {
    pub fn new(
        integration: impl Into<String>,
        device_id: impl Into<String>,
        execution_id: Uuid,
        store: Arc<dyn ContextStore>,
    ) -> Self {
        Self {
            integration: integration.into(),
            device_id: device_id.into(),
            execution_id,
            store,
        }
    }

    pub fn integration(&self) -> &str {
        &self.integration
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn get_field(&self, field: &str) -> Option<Value> {
        self.store.get(&self.key(field))
    }

    pub fn set_field(&self, field: &str, value: Value) {
        self.store.set(self.key(field), value);
    }

    fn key(&self, field: &str) -> ContextKey {
        ContextKey {
            execution_id: self.execution_id,
            integration: self.integration.clone(),
            device_id: self.device_id.clone(),
            field: field.to_string(),
        }
    }
}

/// Caches one [`AppInstance`] per `(integration, device)` for a workflow
/// execution.
#[derive(Debug)]
pub struct InstanceRepo {
    execution_id: Uuid,
    store: Arc<dyn ContextStore>,
    instances: Mutex<HashMap<(String, String), Arc<AppInstance>>>,
}

impl InstanceRepo {
    pub fn new(execution_id: Uuid, store: Arc<dyn ContextStore>) -> Self {
        Self {
            execution_id,
            store,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Get the instance for a device, creating it on first use.
    pub fn get_or_create(&self, integration: &str, device_id: &str) -> Arc<AppInstance> {
        let mut instances = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let key = (integration.to_string(), device_id.to_string());
        if let Some(instance) = instances.get(&key) {
            return Arc::clone(instance);
        }

        debug!(integration, device = device_id, "creating app instance");
        let instance = Arc::new(AppInstance::new(
            integration,
            device_id,
            self.execution_id,
            Arc::clone(&self.store),
        ));
        instances.insert(key, Arc::clone(&instance));
        instance
    }

    /// Forget every instance and the context fields they recorded.
    pub fn shutdown(&self) {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.store.clear_execution(self.execution_id);
    }
}
