// src/signal/bus.rs

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, trace, warn};

use super::Signal;

/// Something that wants to observe signals.
///
/// Closures of the shape `Fn(&Signal) -> anyhow::Result<()>` implement this
/// automatically.
pub trait SignalHandler: Send + Sync {
    fn handle(&self, signal: &Signal) -> anyhow::Result<()>;
}

impl<F> SignalHandler for F
where
    F: Fn(&Signal) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, signal: &Signal) -> anyhow::Result<()> {
        self(signal)
    }
}

/// Handle returned by [`SignalBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    handler: Arc<dyn SignalHandler>,
}

/// Synchronous fan-out of [`Signal`]s to registered handlers.
///
/// Delivery happens on the emitting thread, in registration order. A handler
/// that returns an error or panics is logged and skipped; the remaining
/// handlers still run and the emitting operation is never aborted.
pub struct SignalBus {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler; it sees every signal emitted after this call.
    pub fn subscribe<H>(&self, handler: H) -> SubscriptionId
    where
        H: SignalHandler + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber {
                id,
                handler: Arc::new(handler),
            });
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver a signal to every current subscriber.
    pub fn emit(&self, signal: &Signal) {
        // Snapshot so handlers may (un)subscribe without deadlocking.
        let handlers: Vec<(SubscriptionId, Arc<dyn SignalHandler>)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| (s.id, Arc::clone(&s.handler)))
            .collect();

        trace!(
            kind = %signal.kind,
            action = %signal.source_name,
            subscribers = handlers.len(),
            "emitting signal"
        );

        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(signal))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(
                        subscription = ?id,
                        kind = %signal.kind,
                        error = %err,
                        "signal subscriber returned an error"
                    );
                }
                Err(_) => {
                    error!(
                        subscription = ?id,
                        kind = %signal.kind,
                        "signal subscriber panicked"
                    );
                }
            }
        }
    }
}
