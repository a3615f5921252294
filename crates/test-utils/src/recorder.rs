use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use flowgate::signal::{Signal, SignalBus, SignalKind, SubscriptionId};

/// Records every signal emitted on a bus, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct SignalRecorder {
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl SignalRecorder {
    /// Subscribe a new recorder to `bus`.
    pub fn attach(bus: &SignalBus) -> Self {
        let (recorder, _) = Self::attach_with_id(bus);
        recorder
    }

    pub fn attach_with_id(bus: &SignalBus) -> (Self, SubscriptionId) {
        let recorder = Self::default();
        let sink = Arc::clone(&recorder.signals);
        let id = bus.subscribe(move |signal: &Signal| -> anyhow::Result<()> {
            sink.lock().unwrap().push(signal.clone());
            Ok(())
        });
        (recorder, id)
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<SignalKind> {
        self.signals().into_iter().map(|s| s.kind).collect()
    }

    pub fn count(&self, kind: SignalKind) -> usize {
        self.signals().iter().filter(|s| s.kind == kind).count()
    }

    pub fn clear(&self) {
        self.signals.lock().unwrap().clear();
    }

    /// Poll until at least `n` signals of `kind` were seen, or `timeout`.
    pub fn wait_for(&self, kind: SignalKind, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.count(kind) >= n {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        self.count(kind) >= n
    }
}
