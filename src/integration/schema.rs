// src/integration/schema.rs

//! Declared parameter/type/binding contract of an integration operation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a parameter (or of the data input of a condition or
/// transform). Composite types describe their fields so that coercion can
/// recurse structurally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterType {
    /// Accept anything as-is.
    #[default]
    Any,
    String,
    Number,
    Integer,
    Boolean,
    /// JSON object; listed properties are coerced, unlisted ones pass through.
    Object {
        #[serde(default)]
        properties: BTreeMap<String, ParameterType>,
    },
    /// JSON array whose elements all share `items`.
    Array { items: Box<ParameterType> },
}

impl ParameterType {
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, ParameterType)>,
        K: Into<String>,
    {
        ParameterType::Object {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn array(items: ParameterType) -> Self {
        ParameterType::Array {
            items: Box::new(items),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Any => f.write_str("any"),
            ParameterType::String => f.write_str("string"),
            ParameterType::Number => f.write_str("number"),
            ParameterType::Integer => f.write_str("integer"),
            ParameterType::Boolean => f.write_str("boolean"),
            ParameterType::Object { .. } => f.write_str("object"),
            ParameterType::Array { items } => write!(f, "array of {items}"),
        }
    }
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "schema")]
    pub ty: ParameterType,
    #[serde(default)]
    pub required: bool,
    /// Injected when the parameter is optional and not supplied.
    #[serde(default)]
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }
}

/// Read-only description of one callable, used to validate and coerce its
/// arguments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationSchema {
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Expected type of the data input (conditions and transforms only).
    #[serde(default)]
    pub input: Option<ParameterType>,
    /// Whether the callable needs a bound device instance.
    #[serde(default)]
    pub device_bound: bool,
    /// Statuses, besides `Failure`, that classify a returned result as failed.
    #[serde(default)]
    pub failure_statuses: Vec<String>,
}

impl OperationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn input(mut self, ty: ParameterType) -> Self {
        self.input = Some(ty);
        self
    }

    pub fn device_bound(mut self) -> Self {
        self.device_bound = true;
        self
    }

    pub fn failure_status(mut self, status: impl Into<String>) -> Self {
        self.failure_statuses.push(status.into());
        self
    }

    /// Look up a declared parameter by name.
    pub fn find(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_failure_status(&self, status: &str) -> bool {
        status == "Failure" || self.failure_statuses.iter().any(|s| s == status)
    }
}
