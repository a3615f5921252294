mod common;
use crate::common::{SignalRecorder, init_tracing};

use std::error::Error;
use std::sync::{Arc, Mutex};

use serde_json::json;
use uuid::Uuid;

use flowgate::signal::{Emitter, Signal, SignalBus, SignalKind};

type TestResult = Result<(), Box<dyn Error>>;

fn emit_started(bus: &SignalBus) -> Uuid {
    let execution_id = Uuid::new_v4();
    Emitter::new(bus, Uuid::new_v4(), "probe", execution_id).emit(SignalKind::ActionStarted);
    execution_id
}

#[test]
fn subscribers_run_in_registration_order() -> TestResult {
    init_tracing();
    let bus = SignalBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let seen = Arc::clone(&seen);
        bus.subscribe(move |_: &Signal| -> anyhow::Result<()> {
            seen.lock().unwrap().push(tag);
            Ok(())
        });
    }

    emit_started(&bus);

    assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    Ok(())
}

#[test]
fn failing_subscriber_does_not_stop_delivery() -> TestResult {
    init_tracing();
    let bus = SignalBus::new();

    bus.subscribe(|_: &Signal| -> anyhow::Result<()> { anyhow::bail!("subscriber failed") });
    bus.subscribe(|_: &Signal| -> anyhow::Result<()> { panic!("subscriber panicked") });
    let recorder = SignalRecorder::attach(&bus);

    emit_started(&bus);
    emit_started(&bus);

    assert_eq!(recorder.count(SignalKind::ActionStarted), 2);
    assert_eq!(bus.subscriber_count(), 3);
    Ok(())
}

#[test]
fn unsubscribed_handler_sees_nothing_more() -> TestResult {
    init_tracing();
    let bus = SignalBus::new();
    let (recorder, id) = SignalRecorder::attach_with_id(&bus);

    emit_started(&bus);
    assert!(bus.unsubscribe(id));
    assert!(!bus.unsubscribe(id));
    emit_started(&bus);

    assert_eq!(recorder.count(SignalKind::ActionStarted), 1);
    assert_eq!(bus.subscriber_count(), 0);
    Ok(())
}

#[test]
fn handler_may_subscribe_during_delivery() -> TestResult {
    init_tracing();
    let bus = Arc::new(SignalBus::new());

    {
        let inner = Arc::clone(&bus);
        bus.subscribe(move |_: &Signal| -> anyhow::Result<()> {
            inner.subscribe(|_: &Signal| -> anyhow::Result<()> { Ok(()) });
            Ok(())
        });
    }

    emit_started(&bus);

    assert_eq!(bus.subscriber_count(), 2);
    Ok(())
}

#[test]
fn emitter_stamps_source_and_payload() -> TestResult {
    init_tracing();
    let bus = SignalBus::new();
    let recorder = SignalRecorder::attach(&bus);
    let source_id = Uuid::new_v4();
    let execution_id = Uuid::new_v4();

    let emitter = Emitter::new(&bus, source_id, "probe", execution_id);
    emitter.emit(SignalKind::TriggerAwaitingData);
    emitter.emit_with(SignalKind::TriggerNotTaken, json!("rejected"));

    let signals = recorder.signals();
    assert_eq!(signals.len(), 2);
    assert!(signals.iter().all(|s| s.source_id == source_id
        && s.execution_id == execution_id
        && s.source_name == "probe"));
    assert_eq!(signals[0].payload, None);
    assert_eq!(signals[1].payload, Some(json!("rejected")));
    Ok(())
}

#[test]
fn terminal_kinds_are_exactly_the_three_outcomes() -> TestResult {
    init_tracing();

    let terminal: Vec<SignalKind> = [
        SignalKind::ActionStarted,
        SignalKind::TriggerAwaitingData,
        SignalKind::TriggerTaken,
        SignalKind::TriggerNotTaken,
        SignalKind::ActionExecutionSuccess,
        SignalKind::ActionExecutionError,
        SignalKind::ActionArgumentsInvalid,
    ]
    .into_iter()
    .filter(|k| k.is_terminal())
    .collect();

    assert_eq!(
        terminal,
        vec![
            SignalKind::ActionExecutionSuccess,
            SignalKind::ActionExecutionError,
            SignalKind::ActionArgumentsInvalid,
        ]
    );
    Ok(())
}
