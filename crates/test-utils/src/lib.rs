pub mod builders;
pub mod recorder;

use std::sync::Once;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{ActionFixture, HELLO_WORLD, test_registry};
pub use recorder::SignalRecorder;

static INIT: Once = Once::new();

/// Default deadline for tests that block on a trigger.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run `f` on its own thread and wait at most `timeout` for it.
///
/// Returns `None` on timeout; the thread is left running (a test that hits
/// this is failing anyway).
pub fn run_with_timeout<F, T>(timeout: Duration, f: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).ok()
}
