//! Contract test: a full run must exercise every pacing invariant.
//!
//! Kept as a single test so nothing else in this binary touches the
//! invariant log while it runs.

use pacebench::clock::ManualClock;
use pacebench::invariant_ppt::{
    clear_invariant_log, contract_test, CLASSIFY_CADENCE, CONFIG_VALIDATED, CONSERVATION,
    DONE_MONOTONIC, EMIT_ORDERED, LAG_NON_POSITIVE, QUEUE_DRAINED, SLEEP_NON_NEGATIVE,
};
use pacebench::{Pipeline, SimConfig, WaitStrategy};

#[test]
fn full_run_enforces_all_invariants() {
    clear_invariant_log();

    let config = SimConfig {
        payload_count: 30,
        producer_period_ms: 1,
        wait: WaitStrategy::Spin,
        ..SimConfig::default()
    };
    let report = Pipeline::new(config)
        .unwrap()
        .with_clocks(ManualClock::shared(), ManualClock::shared())
        .run()
        .unwrap();
    assert_eq!(report.processed, 30);

    contract_test(
        "full pipeline run",
        &[
            CONFIG_VALIDATED,
            CLASSIFY_CADENCE,
            EMIT_ORDERED,
            LAG_NON_POSITIVE,
            SLEEP_NON_NEGATIVE,
            DONE_MONOTONIC,
            QUEUE_DRAINED,
            CONSERVATION,
        ],
    );
}
