// src/engine/trigger.rs

//! Suspension of a triggered action until delivered data satisfies its
//! trigger expression.
//!
//! One [`TriggerGate`] exists per action. The executing thread parks in
//! [`TriggerGate::await_acceptance`]; any other thread hands packets in with
//! [`TriggerGate::deliver`]. Packets are queued, so a delivery made before the
//! waiter parks is not lost, and concurrent deliveries are evaluated in the
//! order they arrived.
//!
//! Phases: `Idle -> Awaiting -> {Accepted, Cancelled}`. A rejected packet
//! leaves the gate in `Awaiting`. There is no timeout; callers that need one
//! use [`TriggerGate::cancel`] from a watchdog.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::args::Argument;
use crate::condition::ConditionExpression;
use crate::engine::accumulator::Accumulator;
use crate::signal::{Emitter, SignalKind};

/// A packet delivered to a waiting trigger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerData {
    pub data_in: Value,
    /// Replace same-named arguments of the action, or add new ones.
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

impl TriggerData {
    pub fn new(data_in: Value) -> Self {
        Self {
            data_in,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    Awaiting,
    Accepted,
    Cancelled,
}

/// How [`TriggerGate::await_acceptance`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Accepted(TriggerData),
    Cancelled,
}

#[derive(Debug)]
struct GateState {
    phase: GatePhase,
    pending: VecDeque<TriggerData>,
    cancelled: bool,
}

pub struct TriggerGate {
    state: Mutex<GateState>,
    wake: Condvar,
}

impl fmt::Debug for TriggerGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TriggerGate")
            .field("phase", &state.phase)
            .field("pending", &state.pending.len())
            .field("cancelled", &state.cancelled)
            .finish()
    }
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                phase: GatePhase::Idle,
                pending: VecDeque::new(),
                cancelled: false,
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a packet and wake the waiter, if any. Never blocks on
    /// evaluation.
    pub fn deliver(&self, data: TriggerData) {
        let mut state = self.lock();
        state.pending.push_back(data);
        debug!(pending = state.pending.len(), phase = ?state.phase, "trigger data delivered");
        self.wake.notify_one();
    }

    /// Abort the current (or next) wait of this execution.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.cancelled = true;
        debug!(phase = ?state.phase, "trigger cancelled");
        self.wake.notify_all();
    }

    pub fn phase(&self) -> GatePhase {
        self.lock().phase
    }

    /// Number of delivered packets not yet evaluated.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Back to `Idle` for a new execution. Queued packets are kept.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.phase = GatePhase::Idle;
        state.cancelled = false;
    }

    /// Block until a packet satisfies `trigger`, or until cancelled.
    ///
    /// Emits `TriggerAwaitingData` once on entry and `TriggerNotTaken` for
    /// each rejected packet. Evaluation runs without holding the gate lock, so
    /// deliveries never wait on a slow predicate.
    pub fn await_acceptance(
        &self,
        trigger: &ConditionExpression,
        accumulator: &Accumulator,
        emitter: &Emitter<'_>,
    ) -> GateOutcome {
        self.lock().phase = GatePhase::Awaiting;
        emitter.emit(SignalKind::TriggerAwaitingData);

        loop {
            let data = {
                let mut state = self.lock();
                loop {
                    if state.cancelled {
                        state.phase = GatePhase::Cancelled;
                        return GateOutcome::Cancelled;
                    }
                    if let Some(data) = state.pending.pop_front() {
                        break data;
                    }
                    state = self
                        .wake
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            if trigger.evaluate(&data.data_in, accumulator) {
                self.lock().phase = GatePhase::Accepted;
                debug!("trigger accepted delivered data");
                return GateOutcome::Accepted(data);
            }

            debug!("trigger rejected delivered data");
            emitter.emit_with(SignalKind::TriggerNotTaken, data.data_in);
        }
    }
}
