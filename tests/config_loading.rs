mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use serde_json::json;
use tempfile::NamedTempFile;

use flowgate::config::{load_and_validate, load_from_path, parse_workflow};
use flowgate::errors::FlowgateError;
use flowgate::types::LogicalOperator;

type TestResult = Result<(), Box<dyn Error>>;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn config_error_message(contents: &str) -> String {
    match parse_workflow(contents) {
        Err(FlowgateError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn chain_demo_loads_in_declaration_order() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(demo("chain.toml"))?;

    let names: Vec<&str> = cfg.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["start", "sum", "label"]);
    assert_eq!(cfg.engine.log_level.as_deref(), Some("info"));

    let sum = cfg.action("sum").ok_or("missing action 'sum'")?;
    assert_eq!(sum.integration, "Utilities");
    assert_eq!(sum.arguments.len(), 3);
    assert_eq!(sum.arguments[0].reference.as_deref(), Some("start"));
    assert_eq!(sum.arguments[1].value, Some(json!("2")));
    assert_eq!(sum.references(), vec!["start"]);
    Ok(())
}

#[test]
fn gated_demo_parses_nested_trigger() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(demo("gated.toml"))?;
    let gate = cfg.action("gate").ok_or("missing action 'gate'")?;
    let trigger = gate.trigger.as_ref().ok_or("missing trigger")?;

    assert_eq!(trigger.operator, LogicalOperator::And);
    assert!(!trigger.negated);
    assert_eq!(trigger.conditions.len(), 1);
    assert_eq!(trigger.conditions[0].operation, "greater_than");
    assert_eq!(trigger.conditions[0].transforms.len(), 1);
    assert_eq!(trigger.conditions[0].transforms[0].operation, "to_number");
    Ok(())
}

#[test]
fn device_demo_keeps_device_ids() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(demo("device.toml"))?;

    let devices: Vec<Option<&str>> = cfg.actions.iter().map(|a| a.device.as_deref()).collect();
    assert_eq!(devices, vec![Some("lamp-1"), Some("lamp-1"), Some("lamp-2")]);
    Ok(())
}

#[test]
fn file_on_disk_is_validated() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[[action]]
name = "only"
integration = "Utilities"
operation = "echo"
id = "8f0e5a57-34a6-4d41-9c6b-2b1e1f5d4c11"
position = {{ x = 10.0, y = -2.5 }}
argument = [{{ name = "message", value = {{ nested = [1, 2] }} }}]
"#
    )?;

    let cfg = load_and_validate(file.path())?;
    let only = &cfg.actions[0];

    assert_eq!(
        only.id.map(|id| id.to_string()).as_deref(),
        Some("8f0e5a57-34a6-4d41-9c6b-2b1e1f5d4c11")
    );
    let position = only.position.ok_or("missing position")?;
    assert_eq!((position.x, position.y), (10.0, -2.5));
    assert_eq!(only.arguments[0].value, Some(json!({ "nested": [1, 2] })));
    Ok(())
}

#[test]
fn raw_load_does_not_validate() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(file, "[engine]\nlog_level = \"debug\"\n")?;

    let raw = load_from_path(file.path())?;
    assert!(raw.actions.is_empty());

    assert!(matches!(
        load_and_validate(file.path()),
        Err(FlowgateError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_is_io_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let result = load_and_validate(dir.path().join("absent.toml"));

    assert!(matches!(result, Err(FlowgateError::IoError(_))));
    Ok(())
}

#[test]
fn invalid_toml_is_toml_error() -> TestResult {
    init_tracing();

    let result = parse_workflow("[[action]\nname = ");

    assert!(matches!(result, Err(FlowgateError::TomlError(_))));
    Ok(())
}

#[test]
fn missing_required_field_is_toml_error() -> TestResult {
    init_tracing();

    let result = parse_workflow(
        r#"
[[action]]
name = "no_operation"
integration = "Utilities"
"#,
    );

    assert!(matches!(result, Err(FlowgateError::TomlError(_))));
    Ok(())
}

#[test]
fn duplicate_action_names_are_rejected() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "twice"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 1 }]

[[action]]
name = "twice"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 2 }]
"#,
    );

    assert!(msg.contains("twice"), "{msg}");
    Ok(())
}

#[test]
fn empty_action_name_is_rejected() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "  "
integration = "Utilities"
operation = "always"
"#,
    );

    assert!(msg.contains("empty"), "{msg}");
    Ok(())
}

#[test]
fn argument_with_value_and_reference_is_rejected() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "a"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 1 }]

[[action]]
name = "b"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 1, reference = "a" }]
"#,
    );

    assert!(msg.contains("'message'"), "{msg}");
    Ok(())
}

#[test]
fn malformed_trigger_argument_is_rejected() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "a"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 1 }]

[action.trigger]
[[action.trigger.condition]]
integration = "Utilities"
operation = "greater_than"
argument = [{ name = "threshold" }]
"#,
    );

    assert!(msg.contains("greater_than"), "{msg}");
    Ok(())
}

#[test]
fn unknown_reference_is_rejected() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "a"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "nowhere" }]
"#,
    );

    assert!(msg.contains("nowhere"), "{msg}");
    Ok(())
}

#[test]
fn self_reference_requires_a_trigger() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "loop"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "loop" }]
"#,
    );
    assert!(msg.contains("itself"), "{msg}");

    parse_workflow(
        r#"
[[action]]
name = "loop"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "loop" }]

[action.trigger]
[[action.trigger.condition]]
integration = "Utilities"
operation = "always_true"
"#,
    )?;
    Ok(())
}

#[test]
fn trigger_cannot_reference_own_action() -> TestResult {
    init_tracing();

    let msg = config_error_message(
        r#"
[[action]]
name = "gate"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 1 }]

[action.trigger]
[[action.trigger.condition]]
integration = "Utilities"
operation = "greater_than"
argument = [{ name = "threshold", reference = "gate" }]
"#,
    );

    assert!(msg.contains("gate"), "{msg}");
    Ok(())
}

#[test]
fn reference_cycle_returns_structured_error() -> TestResult {
    init_tracing();

    let result = parse_workflow(
        r#"
[[action]]
name = "A"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "B" }]

[[action]]
name = "B"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "A" }]
"#,
    );

    match result {
        Err(FlowgateError::ReferenceCycle(msg)) => {
            assert!(msg.contains("cycle"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected ReferenceCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn cycle_through_trigger_reference_is_detected() -> TestResult {
    init_tracing();

    let result = parse_workflow(
        r#"
[[action]]
name = "A"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "B" }]

[[action]]
name = "B"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", value = 1 }]

[action.trigger]
[[action.trigger.condition]]
integration = "Utilities"
operation = "equals"
argument = [{ name = "value", reference = "A" }]
"#,
    );

    assert!(matches!(result, Err(FlowgateError::ReferenceCycle(_))));
    Ok(())
}

#[test]
fn trigger_operators_ignore_case() -> TestResult {
    init_tracing();

    let cfg = parse_workflow(
        r#"
[[action]]
name = "gate"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "gate" }]

[action.trigger]
operator = "AND"

[[action.trigger.condition]]
integration = "Utilities"
operation = "always_true"

[[action.trigger.child]]
operator = "Xor"

[[action.trigger.child.condition]]
integration = "Utilities"
operation = "always_true"
"#,
    )?;

    let trigger = cfg
        .action("gate")
        .and_then(|a| a.trigger.as_ref())
        .ok_or("missing trigger")?;
    assert_eq!(trigger.operator, LogicalOperator::And);
    assert_eq!(trigger.children[0].operator, LogicalOperator::Xor);
    Ok(())
}

#[test]
fn unknown_trigger_operator_is_rejected() -> TestResult {
    init_tracing();

    let result = parse_workflow(
        r#"
[[action]]
name = "gate"
integration = "Utilities"
operation = "echo"
argument = [{ name = "message", reference = "gate" }]

[action.trigger]
operator = "nand"
"#,
    );

    match result {
        Err(FlowgateError::TomlError(e)) => assert!(e.to_string().contains("nand")),
        other => panic!("Expected TomlError, got: {:?}", other.map(|_| ())),
    }
    Ok(())
}
