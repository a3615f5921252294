mod common;
use crate::common::{HELLO_WORLD, init_tracing, test_registry};

use std::error::Error;

use serde_json::{Value, json};

use flowgate::args::Argument;
use flowgate::condition::{Condition, ConditionExpression, EvaluationFailure, ValueTransform};
use flowgate::engine::Accumulator;
use flowgate::integration::InMemoryRegistry;
use flowgate::types::LogicalOperator;

type TestResult = Result<(), Box<dyn Error>>;

fn regex(registry: &InMemoryRegistry, pattern: &str) -> Condition {
    Condition::new(
        registry,
        HELLO_WORLD,
        "regex_match",
        vec![Argument::literal("regex", pattern)],
    )
}

fn always(registry: &InMemoryRegistry, outcome: bool) -> ConditionExpression {
    ConditionExpression::Leaf(Condition::new(registry, HELLO_WORLD, "top_condition", vec![]).negated(!outcome))
}

fn eval(expr: &ConditionExpression, input: Value) -> bool {
    expr.evaluate(&input, &Accumulator::new())
}

#[test]
fn regex_condition_matches_anything() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let condition = regex(&registry, "(.*)");

    assert!(condition.errors().is_empty());
    assert!(condition.evaluate(&json!("aaa"), &Accumulator::new()));
    Ok(())
}

#[test]
fn regex_condition_uses_search_semantics() -> TestResult {
    init_tracing();
    let registry = test_registry();
    let acc = Accumulator::new();

    assert!(regex(&registry, "aa").evaluate(&json!("aabb"), &acc));
    assert!(regex(&registry, "bb").evaluate(&json!("aabb"), &acc));
    assert!(!regex(&registry, "^bb").evaluate(&json!("aabb"), &acc));
    Ok(())
}

#[test]
fn negated_condition_inverts_successful_predicate() -> TestResult {
    init_tracing();
    let registry = test_registry();
    let acc = Accumulator::new();

    let condition = regex(&registry, "zzz").negated(true);

    assert!(condition.is_negated());
    assert!(condition.evaluate(&json!("aaa"), &acc));
    assert!(!condition.evaluate(&json!("zzz"), &acc));
    Ok(())
}

#[test]
fn failing_predicate_is_false_even_when_negated() -> TestResult {
    init_tracing();
    let registry = test_registry();
    let acc = Accumulator::new();

    let buggy = Condition::new(&registry, HELLO_WORLD, "buggy_condition", vec![]);
    let panicking = Condition::new(&registry, HELLO_WORLD, "panicking_condition", vec![]);

    assert!(!buggy.evaluate(&json!(1), &acc));
    assert!(!buggy.clone().negated(true).evaluate(&json!(1), &acc));
    assert!(!panicking.evaluate(&json!(1), &acc));
    assert!(!panicking.negated(true).evaluate(&json!(1), &acc));
    Ok(())
}

#[test]
fn invalid_condition_arguments_evaluate_to_false() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let condition = Condition::new(
        &registry,
        HELLO_WORLD,
        "greater_than",
        vec![Argument::literal("threshold", "high")],
    );

    assert_eq!(condition.errors().len(), 1);
    assert!(!condition.evaluate(&json!(100), &Accumulator::new()));
    assert!(matches!(
        condition.try_evaluate(&json!(100), &Accumulator::new()),
        Err(EvaluationFailure::Arguments(_))
    ));
    Ok(())
}

#[test]
fn non_boolean_predicate_result_is_false() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let condition = Condition::new(&registry, HELLO_WORLD, "returns_number", vec![]);

    assert!(!condition.evaluate(&json!(1), &Accumulator::new()));
    assert!(matches!(
        condition.try_evaluate(&json!(1), &Accumulator::new()),
        Err(EvaluationFailure::NotBoolean(_))
    ));
    Ok(())
}

#[test]
fn transforms_run_in_order_before_predicate() -> TestResult {
    init_tracing();
    let registry = test_registry();

    // "4" -> 4 + 3 -> 7 + 1 + 2 -> 10 > 9
    let condition = Condition::new(
        &registry,
        HELLO_WORLD,
        "greater_than",
        vec![Argument::literal("threshold", 9)],
    )
    .with_transform(ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "add_number",
        vec![Argument::literal("amount", 3)],
    ))
    .with_transform(ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "sum_fields",
        vec![Argument::literal("arg1", json!({ "a": 1, "b": "2" }))],
    ));

    assert!(condition.evaluate(&json!("4"), &Accumulator::new()));
    assert!(!condition.evaluate(&json!("3"), &Accumulator::new()));
    Ok(())
}

#[test]
fn failing_transform_passes_value_on_to_predicate() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let condition = regex(&registry, "^keep$").with_transform(ValueTransform::new(
        &registry,
        HELLO_WORLD,
        "buggy_transform",
        vec![],
    ));

    assert!(condition.evaluate(&json!("keep"), &Accumulator::new()));
    Ok(())
}

#[test]
fn condition_arguments_can_reference_accumulator() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let condition = Condition::new(
        &registry,
        HELLO_WORLD,
        "greater_than",
        vec![Argument::reference("threshold", "limit")],
    );
    let acc: Accumulator = [("limit", json!(5))].into_iter().collect();

    assert!(condition.evaluate(&json!(6), &acc));
    assert!(!condition.evaluate(&json!(5), &acc));
    assert!(!condition.evaluate(&json!(6), &Accumulator::new()));
    Ok(())
}

#[test]
fn empty_nodes_follow_vacuous_truth() -> TestResult {
    init_tracing();

    assert!(eval(&ConditionExpression::and(vec![]), json!(null)));
    assert!(!eval(&ConditionExpression::or(vec![]), json!(null)));
    assert!(!eval(&ConditionExpression::xor(vec![]), json!(null)));
    assert!(!eval(&ConditionExpression::and(vec![]).negate(), json!(null)));
    assert!(eval(&ConditionExpression::or(vec![]).negate(), json!(null)));
    Ok(())
}

#[test]
fn operators_combine_children() -> TestResult {
    init_tracing();
    let registry = test_registry();
    let t = || always(&registry, true);
    let f = || always(&registry, false);

    assert!(eval(&ConditionExpression::and(vec![t(), t()]), json!(1)));
    assert!(!eval(&ConditionExpression::and(vec![t(), f()]), json!(1)));
    assert!(eval(&ConditionExpression::or(vec![f(), t()]), json!(1)));
    assert!(!eval(&ConditionExpression::or(vec![f(), f()]), json!(1)));
    assert!(eval(&ConditionExpression::xor(vec![f(), t(), f()]), json!(1)));
    assert!(!eval(&ConditionExpression::xor(vec![t(), t()]), json!(1)));
    Ok(())
}

#[test]
fn negated_node_inverts_combined_result() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let expr = ConditionExpression::Node {
        operator: LogicalOperator::Or,
        negated: true,
        children: vec![always(&registry, false), always(&registry, false)],
    };

    assert!(eval(&expr, json!(1)));
    assert!(!eval(&expr.negate(), json!(1)));
    Ok(())
}

#[test]
fn nested_tree_evaluates_against_input() -> TestResult {
    init_tracing();
    let registry = test_registry();

    // (matches "^a" and (> 10 or matches "z$"))
    let expr = ConditionExpression::and(vec![
        regex(&registry, "^a").into(),
        ConditionExpression::or(vec![
            Condition::new(
                &registry,
                HELLO_WORLD,
                "greater_than",
                vec![Argument::literal("threshold", 10)],
            )
            .into(),
            regex(&registry, "z$").into(),
        ]),
    ]);

    assert!(eval(&expr, json!("abcz")));
    assert!(!eval(&expr, json!("abc")));
    assert!(!eval(&expr, json!("bcz")));
    assert_eq!(expr.conditions().len(), 3);
    Ok(())
}

#[test]
fn broken_leaf_does_not_break_tree() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let expr = ConditionExpression::or(vec![
        Condition::new(&registry, HELLO_WORLD, "panicking_condition", vec![]).into(),
        regex(&registry, "ok").into(),
    ]);

    assert!(eval(&expr, json!("ok")));
    Ok(())
}

#[test]
fn tree_collects_leaf_definition_errors() -> TestResult {
    init_tracing();
    let registry = test_registry();

    let expr = ConditionExpression::and(vec![
        Condition::new(&registry, HELLO_WORLD, "does_not_exist", vec![]).into(),
        Condition::new(&registry, "NoSuchApp", "regex_match", vec![]).into(),
        regex(&registry, ".*").into(),
    ]);

    assert_eq!(expr.errors().len(), 2);
    Ok(())
}
