//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use pidlink_rs::link::{LinkEvent, LinkHandle};
use std::time::{Duration, Instant};

/// How long integration tests wait for an expected event
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Initialize tracing output for a test; safe to call repeatedly
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll the handle until `predicate` matches an event or the timeout
/// expires, returning all events seen along the way
pub fn wait_for_event(
    handle: &LinkHandle,
    timeout: Duration,
    mut predicate: impl FnMut(&LinkEvent) -> bool,
) -> (bool, Vec<LinkEvent>) {
    let deadline = Instant::now() + timeout;
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        for event in handle.drain() {
            let matched = predicate(&event);
            seen.push(event);
            if matched {
                return (true, seen);
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    (false, seen)
}
