// src/engine/accumulator.rs

use std::collections::HashMap;

use serde_json::Value;

/// Most recent result per action name (or alias) for one workflow execution.
///
/// Owned by the workflow driver and lent to actions; only the action invoker
/// writes to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    results: HashMap<String, Value>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.results.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    /// Record `value` under `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.results.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Accumulator {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<HashMap<String, Value>> for Accumulator {
    fn from(results: HashMap<String, Value>) -> Self {
        Self { results }
    }
}
