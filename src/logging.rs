// src/logging.rs

//! Logging setup for `flowgate` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `FLOWGATE_LOG` environment variable (e.g. "info", "debug")
//! 3. `[engine].log_level` from the workflow file
//! 4. default to `info`
//!
//! Logs go to STDERR; stdout carries one JSON line per action result.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "FLOWGATE_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, file_level: Option<&str>) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_level.as_deref(), file_level);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}

/// Pick the effective level; unparsable strings fall through to the next
/// source.
pub fn resolve_level(
    cli_level: Option<LogLevel>,
    env_level: Option<&str>,
    file_level: Option<&str>,
) -> Level {
    cli_level
        .map(level_from_log_level)
        .or_else(|| env_level.and_then(parse_level_str))
        .or_else(|| file_level.and_then(parse_level_str))
        .unwrap_or(Level::INFO)
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
