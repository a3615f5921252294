// src/lib.rs

pub mod args;
pub mod cli;
pub mod condition;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod integration;
pub mod logging;
pub mod signal;
pub mod types;
pub mod workflow;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::engine::{Accumulator, TriggerData};
use crate::integration::builtin;
use crate::signal::{Signal, SignalBus};
use crate::workflow::Workflow;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - workflow loading and validation
/// - logging (the workflow file may carry a level)
/// - the built-in integration registry and the signal bus
/// - pre-delivered `--trigger` data
/// - Ctrl-C handling (cancels waiting triggers)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.workflow)?;
    logging::init_logging(args.log_level, cfg.engine.log_level.as_deref())?;

    let registry = builtin::utilities();
    let bus = Arc::new(SignalBus::new());
    bus.subscribe(|signal: &Signal| -> anyhow::Result<()> {
        debug!(
            kind = %signal.kind,
            action = %signal.source_name,
            execution_id = %signal.execution_id,
            "signal"
        );
        Ok(())
    });

    let workflow = Arc::new(Workflow::from_config(&cfg, &registry, Arc::clone(&bus))?);

    if args.dry_run {
        print_dry_run(&workflow);
        return Ok(());
    }

    for trigger in &args.triggers {
        workflow.send_data_to_trigger(&trigger.action, TriggerData::new(trigger.data.clone()))?;
    }

    // Ctrl-C → cancel every waiting trigger.
    let ctrl_c = {
        let workflow = Arc::clone(&workflow);
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    return;
                }
                workflow.cancel_all();
            }
        })
    };

    let runner = Arc::clone(&workflow);
    let report = tokio::task::spawn_blocking(move || runner.execute(Accumulator::new())).await?;
    ctrl_c.abort();

    for action in &report.results {
        println!("{}", serde_json::to_string(action)?);
    }

    info!(
        executed = report.results.len(),
        cancelled = report.cancelled,
        "run complete"
    );
    Ok(())
}

/// Simple dry-run output: execution order, bindings and validation errors.
fn print_dry_run(workflow: &Workflow) {
    println!("flowgate dry-run");
    println!();

    let order = workflow.execution_order();
    println!("actions ({}):", order.len());
    for action in workflow.actions() {
        println!("  - {}", action.name());
        println!("      operation: {}/{}", action.integration(), action.operation());
        if let Some(device) = action.device_id() {
            println!("      device: {device}");
        }
        for arg in action.arguments() {
            match (&arg.value, &arg.reference) {
                (Some(value), None) => println!("      {} = {value}", arg.name),
                (None, Some(reference)) => println!("      {} <- {reference}", arg.name),
                _ => println!("      {} (malformed)", arg.name),
            }
        }
        if let Some(trigger) = action.trigger() {
            println!("      trigger: {} condition(s)", trigger.conditions().len());
        }
    }

    let errors = workflow.definition_errors();
    if !errors.is_empty() {
        println!();
        println!("validation errors ({}):", errors.len());
        for (action, error) in errors {
            println!("  - {action}: {error}");
        }
    }

    debug!("dry-run complete (no execution)");
}
