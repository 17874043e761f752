//! PPT Invariant System: Runtime invariant enforcement with contract tracking.

#[cfg(feature = "ppt")]
use lazy_static::lazy_static;
#[cfg(feature = "ppt")]
use parking_lot::Mutex;
#[cfg(feature = "ppt")]
use std::collections::HashSet;

// Invariant constants for contract tracking.
pub const CONFIG_VALIDATED: u32 = 1;
pub const CLASSIFY_CADENCE: u32 = 2;
pub const LAG_NON_POSITIVE: u32 = 3;
pub const SLEEP_NON_NEGATIVE: u32 = 4;
pub const EMIT_ORDERED: u32 = 5;
pub const DONE_MONOTONIC: u32 = 6;
pub const QUEUE_DRAINED: u32 = 7;
pub const CONSERVATION: u32 = 8;

#[cfg(feature = "ppt")]
lazy_static! {
    static ref INVARIANT_LOG: Mutex<HashSet<u32>> = Mutex::new(HashSet::new());
}

#[cfg(feature = "ppt")]
/// Assert an invariant: logs it and panics on failure.
pub(crate) fn assert_invariant(id: u32, condition: bool, message: &str, context: Option<&str>) {
    if !condition {
        let full_message = if let Some(ctx) = context {
            format!("Invariant {} failed: {} (context: {})", id, message, ctx)
        } else {
            format!("Invariant {} failed: {}", id, message)
        };
        tracing::error!("{}", full_message);
        panic!("{}", full_message);
    }
    INVARIANT_LOG.lock().insert(id);
}

#[cfg(not(feature = "ppt"))]
/// Assert an invariant: checks condition and panics on failure.
pub(crate) fn assert_invariant(_id: u32, condition: bool, message: &str, _context: Option<&str>) {
    if !condition {
        panic!("Invariant failed: {}", message);
    }
}

#[cfg(feature = "ppt")]
/// Contract test: checks that specified invariants were asserted.
pub fn contract_test(test_name: &str, required_invariants: &[u32]) {
    let log = INVARIANT_LOG.lock();
    let missing: Vec<u32> = required_invariants
        .iter()
        .copied()
        .filter(|inv| !log.contains(inv))
        .collect();
    drop(log);
    if !missing.is_empty() {
        panic!(
            "Contract test '{}' failed: invariants not enforced: {:?}",
            test_name,
            missing.iter().map(|&id| invariant_name(id)).collect::<Vec<_>>()
        );
    }
}

#[cfg(not(feature = "ppt"))]
/// Contract test: no-op when PPT feature is disabled.
pub fn contract_test(_test_name: &str, _required_invariants: &[u32]) {}

#[cfg(feature = "ppt")]
/// Clear invariant log (for between test runs).
pub fn clear_invariant_log() {
    INVARIANT_LOG.lock().clear();
}

#[cfg(not(feature = "ppt"))]
/// Clear invariant log: no-op when PPT feature is disabled.
pub fn clear_invariant_log() {}

/// Maps invariant ID to human-readable name (for diagnostics only).
pub const fn invariant_name(id: u32) -> &'static str {
    match id {
        CONFIG_VALIDATED => "CONFIG_VALIDATED",
        CLASSIFY_CADENCE => "CLASSIFY_CADENCE",
        LAG_NON_POSITIVE => "LAG_NON_POSITIVE",
        SLEEP_NON_NEGATIVE => "SLEEP_NON_NEGATIVE",
        EMIT_ORDERED => "EMIT_ORDERED",
        DONE_MONOTONIC => "DONE_MONOTONIC",
        QUEUE_DRAINED => "QUEUE_DRAINED",
        CONSERVATION => "CONSERVATION",
        _ => "UNKNOWN",
    }
}
