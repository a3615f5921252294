#![allow(dead_code)]

use std::sync::Arc;

use regex::Regex;
use serde_json::{Value, json};

use flowgate::engine::{Action, ActionBuilder};
use flowgate::integration::{
    CallError, InMemoryRegistry, Operation, OperationReturn, OperationSchema, ParameterSpec,
    ParameterType,
};
use flowgate::signal::SignalBus;

use crate::recorder::SignalRecorder;

pub const HELLO_WORLD: &str = "HelloWorld";

/// Registry with a `HelloWorld` integration covering every shape of
/// operation the engine cares about (plain, failing, panicking, bound,
/// custom status, composite arguments).
pub fn test_registry() -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    register_actions(&mut registry);
    register_conditions(&mut registry);
    register_transforms(&mut registry);
    registry
}

fn register_actions(registry: &mut InMemoryRegistry) {
    registry
        .register(Operation::action(
            HELLO_WORLD,
            "hello_world",
            OperationSchema::new(),
            |_| Ok(json!({ "message": "HELLO WORLD" }).into()),
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "return_plus_one",
            OperationSchema::new()
                .parameter(ParameterSpec::required("number", ParameterType::Number)),
            |inv| Ok(json!(inv.number("number")? + 1.0).into()),
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "add_three",
            OperationSchema::new()
                .parameter(ParameterSpec::required("num1", ParameterType::Number))
                .parameter(ParameterSpec::required("num2", ParameterType::Number))
                .parameter(ParameterSpec::required("num3", ParameterType::Number)),
            |inv| {
                Ok(json!(inv.number("num1")? + inv.number("num2")? + inv.number("num3")?).into())
            },
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "greet",
            OperationSchema::new()
                .parameter(ParameterSpec::required("name", ParameterType::String))
                .parameter(
                    ParameterSpec::optional("greeting", ParameterType::String)
                        .with_default(json!("hello")),
                ),
            |inv| {
                Ok(json!(format!("{} {}", inv.string("greeting")?, inv.string("name")?)).into())
            },
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "json_sample",
            OperationSchema::new().parameter(ParameterSpec::required(
                "json_in",
                ParameterType::object([
                    ("a", ParameterType::Number),
                    (
                        "b",
                        ParameterType::object([
                            ("a", ParameterType::Number),
                            ("b", ParameterType::Number),
                        ]),
                    ),
                    ("c", ParameterType::array(ParameterType::Integer)),
                ]),
            )),
            |inv| {
                let j = inv.arg("json_in")?;
                let num = |v: &Value| v.as_f64().unwrap_or(0.0);
                let c: f64 = j["c"]
                    .as_array()
                    .map(|items| items.iter().map(num).sum())
                    .unwrap_or(0.0);
                Ok(json!(num(&j["a"]) + num(&j["b"]["a"]) + num(&j["b"]["b"]) + c).into())
            },
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "buggy_action",
            OperationSchema::new(),
            |_| Err(CallError::Other(anyhow::anyhow!("something went very wrong"))),
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "panicking_action",
            OperationSchema::new(),
            |_| panic!("integration blew up"),
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "reject_arguments",
            OperationSchema::new(),
            |_| Err(CallError::InvalidArguments("value out of range".to_string())),
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "custom_status",
            OperationSchema::new()
                .parameter(ParameterSpec::required("status", ParameterType::String))
                .failure_status("CustomFailure"),
            |inv| Ok(OperationReturn::with_status(json!("done"), inv.string("status")?)),
        ))
        .register(Operation::action(
            HELLO_WORLD,
            "count",
            OperationSchema::new().device_bound(),
            |inv| {
                let instance = inv.instance()?;
                let next = instance
                    .get_field("count")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0)
                    + 1;
                instance.set_field("count", json!(next));
                Ok(json!(next).into())
            },
        ));
}

fn register_conditions(registry: &mut InMemoryRegistry) {
    registry
        .register(Operation::condition(
            HELLO_WORLD,
            "regex_match",
            OperationSchema::new()
                .parameter(ParameterSpec::required("regex", ParameterType::String))
                .input(ParameterType::String),
            |inv| {
                let re = Regex::new(inv.string("regex")?)
                    .map_err(|e| CallError::InvalidArguments(e.to_string()))?;
                Ok(re.is_match(inv.data_str()?))
            },
        ))
        .register(Operation::condition(
            HELLO_WORLD,
            "greater_than",
            OperationSchema::new()
                .parameter(ParameterSpec::required("threshold", ParameterType::Number))
                .input(ParameterType::Number),
            |inv| Ok(inv.data_number()? > inv.number("threshold")?),
        ))
        .register(Operation::condition(
            HELLO_WORLD,
            "top_condition",
            OperationSchema::new().input(ParameterType::Any),
            |_| Ok(true),
        ))
        .register(Operation::condition(
            HELLO_WORLD,
            "buggy_condition",
            OperationSchema::new(),
            |_| Err(CallError::Failed("condition exploded".to_string())),
        ))
        .register(Operation::condition(
            HELLO_WORLD,
            "panicking_condition",
            OperationSchema::new(),
            |_| panic!("condition panicked"),
        ))
        .register(Operation::new(
            flowgate::integration::OperationKind::Condition,
            HELLO_WORLD,
            "returns_number",
            OperationSchema::new(),
            |_| Ok(json!(42).into()),
        ));
}

fn register_transforms(registry: &mut InMemoryRegistry) {
    registry
        .register(Operation::transform(
            HELLO_WORLD,
            "top_transform",
            OperationSchema::new().input(ParameterType::Any),
            |_| Ok(json!("top transform")),
        ))
        .register(Operation::transform(
            HELLO_WORLD,
            "add_number",
            OperationSchema::new()
                .parameter(ParameterSpec::required("amount", ParameterType::Number))
                .input(ParameterType::Number),
            |inv| Ok(json!(inv.data_number()? + inv.number("amount")?)),
        ))
        .register(Operation::transform(
            HELLO_WORLD,
            "sum_fields",
            OperationSchema::new()
                .parameter(ParameterSpec::required(
                    "arg1",
                    ParameterType::object([
                        ("a", ParameterType::Number),
                        ("b", ParameterType::Number),
                    ]),
                ))
                .input(ParameterType::Number),
            |inv| {
                let arg1 = inv.arg("arg1")?;
                let a = arg1["a"].as_f64().unwrap_or(0.0);
                let b = arg1["b"].as_f64().unwrap_or(0.0);
                Ok(json!(inv.data_number()? + a + b))
            },
        ))
        .register(Operation::transform(
            HELLO_WORLD,
            "buggy_transform",
            OperationSchema::new().input(ParameterType::Any),
            |_| Err(CallError::Failed("transform exploded".to_string())),
        ))
        .register(Operation::transform(
            HELLO_WORLD,
            "panicking_transform",
            OperationSchema::new().input(ParameterType::Any),
            |_| panic!("transform panicked"),
        ));
}

/// Registry, bus and recorder shared by a test.
pub struct ActionFixture {
    pub registry: Arc<InMemoryRegistry>,
    pub bus: Arc<SignalBus>,
    pub recorder: SignalRecorder,
}

impl ActionFixture {
    pub fn new() -> Self {
        Self::with_registry(test_registry())
    }

    pub fn with_registry(registry: InMemoryRegistry) -> Self {
        let bus = Arc::new(SignalBus::new());
        let recorder = SignalRecorder::attach(&bus);
        Self {
            registry: Arc::new(registry),
            bus,
            recorder,
        }
    }

    /// Start building a `HelloWorld` action.
    pub fn action(&self, name: &str, operation: &str) -> ActionBuilder {
        Action::builder(name, HELLO_WORLD, operation)
    }

    pub fn build(&self, builder: ActionBuilder) -> Action {
        builder
            .build(self.registry.as_ref(), Arc::clone(&self.bus))
            .expect("failed to build action")
    }
}

impl Default for ActionFixture {
    fn default() -> Self {
        Self::new()
    }
}
