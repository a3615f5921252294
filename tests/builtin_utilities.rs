mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use flowgate::args::Argument;
use flowgate::condition::{Condition, ValueTransform};
use flowgate::engine::{Accumulator, Action, ResultStatus};
use flowgate::integration::builtin::{UTILITIES, utilities};
use flowgate::integration::{AppInstance, InMemoryContextStore, InMemoryRegistry};
use flowgate::signal::SignalBus;

type TestResult = Result<(), Box<dyn Error>>;

fn run(registry: &InMemoryRegistry, operation: &str, args: Vec<Argument>) -> (ResultStatus, Value) {
    let action = Action::builder(operation, UTILITIES, operation)
        .arguments(args)
        .build(registry, Arc::new(SignalBus::new()))
        .expect("utility action should build");
    let result = action.execute(&mut Accumulator::new(), None, None);
    (result.status, result.result)
}

fn check(registry: &InMemoryRegistry, operation: &str, args: Vec<Argument>, input: Value) -> bool {
    Condition::new(registry, UTILITIES, operation, args).evaluate(&input, &Accumulator::new())
}

fn transform(registry: &InMemoryRegistry, operation: &str, args: Vec<Argument>, input: Value) -> Value {
    ValueTransform::new(registry, UTILITIES, operation, args).apply(&input, &Accumulator::new())
}

#[test]
fn utility_actions_behave() -> TestResult {
    init_tracing();
    let registry = utilities();

    assert_eq!(
        run(&registry, "echo", vec![Argument::literal("message", json!({ "k": 1 }))]),
        (ResultStatus::Success, json!({ "k": 1 }))
    );
    assert_eq!(
        run(
            &registry,
            "add_three",
            vec![
                Argument::literal("num1", 1),
                Argument::literal("num2", "2.5"),
                Argument::literal("num3", 0.5),
            ]
        ),
        (ResultStatus::Success, json!(4))
    );
    assert_eq!(
        run(
            &registry,
            "concat",
            vec![Argument::literal("left", "a"), Argument::literal("right", 7)]
        ),
        (ResultStatus::Success, json!("a7"))
    );
    Ok(())
}

#[test]
fn set_status_reports_custom_statuses() -> TestResult {
    init_tracing();
    let registry = utilities();

    let (status, value) = run(
        &registry,
        "set_status",
        vec![
            Argument::literal("status", "Pending"),
            Argument::literal("value", 3),
        ],
    );
    assert_eq!(status, ResultStatus::Other("Pending".to_string()));
    assert_eq!(value, json!(3));

    let action = Action::builder("flagged", UTILITIES, "set_status")
        .argument(Argument::literal("status", "Error"))
        .build(&registry, Arc::new(SignalBus::new()))?;
    let mut acc = Accumulator::new();
    action.execute(&mut acc, None, None);
    assert!(!acc.contains("flagged"));
    Ok(())
}

#[test]
fn fail_is_an_unhandled_exception() -> TestResult {
    init_tracing();
    let registry = utilities();

    let (status, value) = run(&registry, "fail", vec![]);

    assert_eq!(status, ResultStatus::UnhandledException);
    assert!(value.as_str().is_some_and(|m| m.contains("failure requested")));
    Ok(())
}

#[test]
fn remember_and_recall_use_instance_fields() -> TestResult {
    init_tracing();
    let registry = utilities();
    let instance = AppInstance::new(
        UTILITIES,
        "lamp",
        Uuid::new_v4(),
        Arc::new(InMemoryContextStore::new()),
    );
    let bus = Arc::new(SignalBus::new());

    let remember = Action::builder("remember", UTILITIES, "remember")
        .device("lamp")
        .argument(Argument::literal("field", "level"))
        .argument(Argument::literal("value", 9))
        .build(&registry, Arc::clone(&bus))?;
    let recall = Action::builder("recall", UTILITIES, "recall")
        .device("lamp")
        .argument(Argument::literal("field", "level"))
        .build(&registry, bus)?;

    let mut acc = Accumulator::new();
    assert_eq!(recall.execute(&mut acc, None, Some(&instance)).result, Value::Null);
    remember.execute(&mut acc, None, Some(&instance));
    assert_eq!(recall.execute(&mut acc, None, Some(&instance)).result, json!(9));
    Ok(())
}

#[test]
fn utility_conditions_behave() -> TestResult {
    init_tracing();
    let registry = utilities();

    assert!(check(&registry, "regex_match", vec![Argument::literal("regex", r"^\d+$")], json!("123")));
    assert!(check(&registry, "regex_match", vec![Argument::literal("regex", r"^\d+$")], json!(123)));
    assert!(!check(&registry, "regex_match", vec![Argument::literal("regex", "(")], json!("(")));
    assert!(check(&registry, "greater_than", vec![Argument::literal("threshold", "1.5")], json!(2)));
    assert!(!check(&registry, "greater_than", vec![Argument::literal("threshold", 2)], json!(2)));
    assert!(check(&registry, "equals", vec![Argument::literal("value", json!([1, "a"]))], json!([1, "a"])));
    assert!(!check(&registry, "equals", vec![Argument::literal("value", 1)], json!("1")));
    assert!(check(&registry, "always_true", vec![], json!(null)));
    Ok(())
}

#[test]
fn utility_transforms_behave() -> TestResult {
    init_tracing();
    let registry = utilities();

    assert_eq!(transform(&registry, "to_number", vec![], json!(" 42 ")), json!(42));
    assert_eq!(transform(&registry, "to_number", vec![], json!("x")), json!("x"));
    assert_eq!(
        transform(&registry, "add", vec![Argument::literal("amount", 0.5)], json!(1)),
        json!(1.5)
    );
    assert_eq!(transform(&registry, "length", vec![], json!("héllo")), json!(5));
    assert_eq!(transform(&registry, "length", vec![], json!([1, 2, 3])), json!(3));
    assert_eq!(transform(&registry, "length", vec![], json!(true)), json!(true));
    assert_eq!(transform(&registry, "upper", vec![], json!("abc")), json!("ABC"));
    Ok(())
}
