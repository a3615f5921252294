#![allow(dead_code)]

use flowgate::integration::{IntegrationRegistry, OperationKind, OperationSchema};

pub use flowgate_test_utils::{
    ActionFixture, HELLO_WORLD, SignalRecorder, TEST_TIMEOUT, init_tracing, run_with_timeout,
    test_registry,
};

/// Schema of a `HelloWorld` operation from the test registry.
pub fn schema_of(kind: OperationKind, operation: &str) -> OperationSchema {
    test_registry()
        .lookup(kind, HELLO_WORLD, operation)
        .map(|op| op.schema.clone())
        .expect("operation registered in test registry")
}

