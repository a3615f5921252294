// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};
use serde_json::Value;

/// Command-line arguments for `flowgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowgate",
    version,
    about = "Run a workflow of integration actions with data-gated triggers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Flowgate.toml")]
    pub workflow: String,

    /// Validate and print the execution order, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLOWGATE_LOG`, then `[engine].log_level`, then `info`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Deliver data to a triggered action before the run starts.
    ///
    /// `NAME=JSON`; a value that is not valid JSON is sent as a string.
    /// May be repeated; deliveries to one action are evaluated in order.
    #[arg(long = "trigger", value_name = "NAME=JSON", value_parser = parse_trigger)]
    pub triggers: Vec<TriggerArg>,
}

/// One `--trigger` delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerArg {
    pub action: String,
    pub data: Value,
}

/// Parse `NAME=JSON`.
pub fn parse_trigger(s: &str) -> Result<TriggerArg, String> {
    let (action, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=JSON, got '{s}'"))?;
    let action = action.trim();
    if action.is_empty() {
        return Err(format!("missing action name in '{s}'"));
    }
    let data = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok(TriggerArg {
        action: action.to_string(),
        data,
    })
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
