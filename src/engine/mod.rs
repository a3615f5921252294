// src/engine/mod.rs

//! Action execution engine.
//!
//! This module ties together:
//! - the accumulator of prior results shared across one workflow execution
//! - the trigger gate that parks a triggered action until data qualifies
//! - the action invoker state machine and its status-tagged results
//!
//! Argument resolution lives in [`crate::args`], trigger expressions in
//! [`crate::condition`]; this module only sequences them.

pub mod accumulator;
pub mod action;
pub mod result;
pub mod trigger;

pub use accumulator::Accumulator;
pub use action::{Action, ActionBuilder, ActionPhase};
pub use result::{ActionResult, ResultStatus};
pub use trigger::{GateOutcome, GatePhase, TriggerData, TriggerGate};
