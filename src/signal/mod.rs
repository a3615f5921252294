// src/signal/mod.rs

//! In-process publish/subscribe channel for action life-cycle events.
//!
//! - [`bus`] holds the [`SignalBus`] itself: synchronous delivery on the
//!   emitting thread, in registration order, with failing subscribers
//!   isolated and logged.
//! - [`Emitter`] binds a bus to one action execution so the engine can emit
//!   without repeating the source identity at every call site.
//!
//! The bus is owned by whoever drives the workflow and handed to each action
//! as an `Arc<SignalBus>`; there is no global instance.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub mod bus;

pub use bus::{SignalBus, SignalHandler, SubscriptionId};

/// Kinds of events emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignalKind {
    ActionStarted,
    TriggerAwaitingData,
    TriggerTaken,
    TriggerNotTaken,
    ActionExecutionSuccess,
    ActionExecutionError,
    ActionArgumentsInvalid,
}

impl SignalKind {
    /// Whether this kind ends an `execute` call. Exactly one terminal signal
    /// is emitted per execution.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SignalKind::ActionExecutionSuccess
                | SignalKind::ActionExecutionError
                | SignalKind::ActionArgumentsInvalid
        )
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single event as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// Stable identity of the action that emitted the signal.
    pub source_id: Uuid,
    /// Display name of the emitting action.
    pub source_name: String,
    /// Correlation id of the execution the signal belongs to.
    pub execution_id: Uuid,
    pub kind: SignalKind,
    pub payload: Option<Value>,
}

/// Emits signals on behalf of one action execution.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    bus: &'a SignalBus,
    source_id: Uuid,
    source_name: &'a str,
    execution_id: Uuid,
}

impl<'a> Emitter<'a> {
    pub fn new(bus: &'a SignalBus, source_id: Uuid, source_name: &'a str, execution_id: Uuid) -> Self {
        Self {
            bus,
            source_id,
            source_name,
            execution_id,
        }
    }

    pub fn emit(&self, kind: SignalKind) {
        self.send(kind, None);
    }

    pub fn emit_with(&self, kind: SignalKind, payload: Value) {
        self.send(kind, Some(payload));
    }

    fn send(&self, kind: SignalKind, payload: Option<Value>) {
        self.bus.emit(&Signal {
            source_id: self.source_id,
            source_name: self.source_name.to_string(),
            execution_id: self.execution_id,
            kind,
            payload,
        });
    }
}
