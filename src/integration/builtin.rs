// src/integration/builtin.rs

//! The `Utilities` integration shipped with the binary.
//!
//! Small, dependency-free operations so that a workflow file can be run
//! end-to-end without loading any external integration:
//!
//! - actions: `echo`, `add_three`, `concat`, `set_status`, `remember`,
//!   `recall`, `fail`
//! - conditions: `regex_match`, `greater_than`, `equals`, `always_true`
//! - transforms: `to_number`, `add`, `length`, `upper`

use regex::Regex;
use serde_json::{Value, json};

use crate::args::coerce::number_value;
use crate::integration::registry::{CallError, InMemoryRegistry, Operation, OperationReturn};
use crate::integration::schema::{OperationSchema, ParameterSpec, ParameterType};

pub const UTILITIES: &str = "Utilities";

/// Registry containing only the `Utilities` integration.
pub fn utilities() -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    register_utilities(&mut registry);
    registry
}

pub fn register_utilities(registry: &mut InMemoryRegistry) {
    register_actions(registry);
    register_conditions(registry);
    register_transforms(registry);
}

fn register_actions(registry: &mut InMemoryRegistry) {
    registry.register(Operation::action(
        UTILITIES,
        "echo",
        OperationSchema::new().parameter(ParameterSpec::required("message", ParameterType::Any)),
        |inv| Ok(inv.arg("message")?.clone().into()),
    ));

    registry.register(Operation::action(
        UTILITIES,
        "add_three",
        OperationSchema::new()
            .parameter(ParameterSpec::required("num1", ParameterType::Number))
            .parameter(ParameterSpec::required("num2", ParameterType::Number))
            .parameter(ParameterSpec::required("num3", ParameterType::Number)),
        |inv| {
            let sum = inv.number("num1")? + inv.number("num2")? + inv.number("num3")?;
            Ok(number_value(sum).into())
        },
    ));

    registry.register(Operation::action(
        UTILITIES,
        "concat",
        OperationSchema::new()
            .parameter(ParameterSpec::required("left", ParameterType::String))
            .parameter(ParameterSpec::required("right", ParameterType::String))
            .parameter(
                ParameterSpec::optional("separator", ParameterType::String)
                    .with_default(json!("")),
            ),
        |inv| {
            let joined = format!(
                "{}{}{}",
                inv.string("left")?,
                inv.string("separator")?,
                inv.string("right")?
            );
            Ok(Value::String(joined).into())
        },
    ));

    registry.register(Operation::action(
        UTILITIES,
        "set_status",
        OperationSchema::new()
            .parameter(ParameterSpec::required("status", ParameterType::String))
            .parameter(ParameterSpec::optional("value", ParameterType::Any).with_default(Value::Null))
            .failure_status("Error"),
        |inv| {
            Ok(OperationReturn::with_status(
                inv.arg("value")?.clone(),
                inv.string("status")?,
            ))
        },
    ));

    registry.register(Operation::action(
        UTILITIES,
        "remember",
        OperationSchema::new()
            .parameter(ParameterSpec::required("field", ParameterType::String))
            .parameter(ParameterSpec::required("value", ParameterType::Any))
            .device_bound(),
        |inv| {
            let value = inv.arg("value")?.clone();
            inv.instance()?.set_field(inv.string("field")?, value.clone());
            Ok(value.into())
        },
    ));

    registry.register(Operation::action(
        UTILITIES,
        "recall",
        OperationSchema::new()
            .parameter(ParameterSpec::required("field", ParameterType::String))
            .device_bound(),
        |inv| {
            let value = inv
                .instance()?
                .get_field(inv.string("field")?)
                .unwrap_or(Value::Null);
            Ok(value.into())
        },
    ));

    registry.register(Operation::action(
        UTILITIES,
        "fail",
        OperationSchema::new().parameter(
            ParameterSpec::optional("message", ParameterType::String)
                .with_default(json!("failure requested")),
        ),
        |inv| Err(CallError::Failed(inv.string("message")?.to_string())),
    ));
}

fn register_conditions(registry: &mut InMemoryRegistry) {
    registry.register(Operation::condition(
        UTILITIES,
        "regex_match",
        OperationSchema::new()
            .parameter(ParameterSpec::required("regex", ParameterType::String))
            .input(ParameterType::String),
        |inv| {
            let pattern = inv.string("regex")?;
            let re = Regex::new(pattern)
                .map_err(|e| CallError::InvalidArguments(format!("bad regex '{pattern}': {e}")))?;
            Ok(re.is_match(inv.data_str()?))
        },
    ));

    registry.register(Operation::condition(
        UTILITIES,
        "greater_than",
        OperationSchema::new()
            .parameter(ParameterSpec::required("threshold", ParameterType::Number))
            .input(ParameterType::Number),
        |inv| Ok(inv.data_number()? > inv.number("threshold")?),
    ));

    registry.register(Operation::condition(
        UTILITIES,
        "equals",
        OperationSchema::new()
            .parameter(ParameterSpec::required("value", ParameterType::Any))
            .input(ParameterType::Any),
        |inv| Ok(inv.data()? == inv.arg("value")?),
    ));

    registry.register(Operation::condition(
        UTILITIES,
        "always_true",
        OperationSchema::new(),
        |_| Ok(true),
    ));
}

fn register_transforms(registry: &mut InMemoryRegistry) {
    registry.register(Operation::transform(
        UTILITIES,
        "to_number",
        OperationSchema::new().input(ParameterType::Number),
        |inv| Ok(number_value(inv.data_number()?)),
    ));

    registry.register(Operation::transform(
        UTILITIES,
        "add",
        OperationSchema::new()
            .parameter(ParameterSpec::required("amount", ParameterType::Number))
            .input(ParameterType::Number),
        |inv| Ok(number_value(inv.data_number()? + inv.number("amount")?)),
    ));

    registry.register(Operation::transform(
        UTILITIES,
        "length",
        OperationSchema::new().input(ParameterType::Any),
        |inv| match inv.data()? {
            Value::String(s) => Ok(json!(s.chars().count())),
            Value::Array(items) => Ok(json!(items.len())),
            Value::Object(map) => Ok(json!(map.len())),
            other => Err(CallError::Failed(format!("value has no length: {other}"))),
        },
    ));

    registry.register(Operation::transform(
        UTILITIES,
        "upper",
        OperationSchema::new().input(ParameterType::String),
        |inv| Ok(Value::String(inv.data_str()?.to_uppercase())),
    ));
}
