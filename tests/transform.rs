mod common;
use crate::common::{HELLO_WORLD, init_tracing, test_registry};

use std::error::Error;

use serde_json::json;

use flowgate::args::Argument;
use flowgate::condition::{EvaluationFailure, ValueTransform};
use flowgate::engine::Accumulator;
use flowgate::errors::DefinitionError;
use flowgate::integration::LookupError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn applies_transform_with_resolved_arguments() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "add_number",
        vec![Argument::literal("amount", "2.5")],
    );

    assert!(transform.errors().is_empty());
    assert_eq!(transform.apply(&json!(1.5), &Accumulator::new()), json!(4.0));
    Ok(())
}

#[test]
fn numeric_string_input_is_coerced_before_applying() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "add_number",
        vec![Argument::literal("amount", 1)],
    );

    assert_eq!(transform.apply(&json!("41"), &Accumulator::new()), json!(42.0));
    Ok(())
}

#[test]
fn failing_transform_returns_input_unchanged() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(&registry, HELLO_WORLD, "buggy_transform", vec![]);

    assert_eq!(
        transform.apply(&json!("anything"), &Accumulator::new()),
        json!("anything")
    );
    assert!(matches!(
        transform.try_apply(&json!("anything"), &Accumulator::new()),
        Err(EvaluationFailure::Call(_))
    ));
    Ok(())
}

#[test]
fn panicking_transform_returns_input_unchanged() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(&registry, HELLO_WORLD, "panicking_transform", vec![]);

    assert_eq!(
        transform.apply(&json!({ "k": [1, 2] }), &Accumulator::new()),
        json!({ "k": [1, 2] })
    );
    Ok(())
}

#[test]
fn invalid_arguments_return_input_unchanged() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "add_number",
        vec![Argument::literal("amount", "lots")],
    );

    assert_eq!(transform.errors().len(), 1);
    assert_eq!(transform.apply(&json!(3), &Accumulator::new()), json!(3));
    Ok(())
}

#[test]
fn uncoercible_input_is_returned_unchanged() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "add_number",
        vec![Argument::literal("amount", 1)],
    );

    assert_eq!(transform.apply(&json!("abc"), &Accumulator::new()), json!("abc"));
    assert!(matches!(
        transform.try_apply(&json!("abc"), &Accumulator::new()),
        Err(EvaluationFailure::Input { .. })
    ));
    Ok(())
}

#[test]
fn unknown_transform_is_recorded_and_passes_input_through() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(&registry, HELLO_WORLD, "no_such_transform", vec![]);

    assert!(matches!(
        transform.errors(),
        [DefinitionError::Lookup(LookupError::UnknownOperation { .. })]
    ));
    assert_eq!(transform.apply(&json!(7), &Accumulator::new()), json!(7));
    Ok(())
}

#[test]
fn transform_arguments_can_reference_accumulator() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "sum_fields",
        vec![Argument::reference("arg1", "previous")],
    );
    let acc: Accumulator = [("previous", json!({ "a": "1", "b": 2 }))].into_iter().collect();

    assert_eq!(transform.apply(&json!(10), &acc), json!(13.0));
    Ok(())
}

#[test]
fn missing_reference_makes_transform_fail_soft() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let transform = ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "sum_fields",
        vec![Argument::reference("arg1", "never_ran")],
    );

    assert_eq!(transform.apply(&json!(10), &Accumulator::new()), json!(10));
    Ok(())
}
