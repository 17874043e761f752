//! Deterministic pacing scenarios on a virtual clock.

use pacebench::clock::{Clock, ManualClock};
use pacebench::consumer::PacedConsumer;
use pacebench::work::WorkKind;
use std::sync::Arc;
use std::time::Duration;

const EPS: f64 = 1e-9;

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

/// small = 2ms, heavy = 20ms, target = 100Hz (10ms period).
fn reference_consumer() -> (Arc<ManualClock>, PacedConsumer) {
    let clock = ManualClock::shared();
    let consumer = PacedConsumer::new(
        Duration::from_millis(2),
        Duration::from_millis(20),
        100,
        clock.clone(),
    )
    .unwrap();
    (clock, consumer)
}

#[test]
fn small_item_sleeps_remaining_period() {
    let (clock, mut consumer) = reference_consumer();
    let outcome = consumer.process(WorkKind::Small);
    approx(outcome.work_ms, 2.0);
    approx(outcome.slack_ms, 8.0);
    approx(outcome.gained_ms, 8.0);
    approx(outcome.slept_ms, 8.0);
    approx(consumer.lag_ms(), 0.0);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_millis(2), Duration::from_millis(8)]
    );
}

#[test]
fn heavy_item_builds_debt_without_sleeping() {
    let (clock, mut consumer) = reference_consumer();
    let outcome = consumer.process(WorkKind::Heavy);
    approx(outcome.work_ms, 20.0);
    approx(outcome.slack_ms, -10.0);
    approx(outcome.gained_ms, -10.0);
    approx(outcome.slept_ms, 0.0);
    approx(consumer.lag_ms(), -10.0);
    assert_eq!(clock.now(), Duration::from_millis(20));
}

#[test]
fn debt_carries_into_next_small_item() {
    let (clock, mut consumer) = reference_consumer();
    consumer.process(WorkKind::Heavy);
    clock.clear_sleeps();

    let outcome = consumer.process(WorkKind::Small);
    approx(outcome.slack_ms, 8.0);
    approx(outcome.gained_ms, -2.0);
    approx(outcome.slept_ms, 0.0);
    approx(consumer.lag_ms(), -2.0);
    // Work only, no pacing sleep.
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(2)]);

    let outcome = consumer.process(WorkKind::Small);
    approx(outcome.gained_ms, 6.0);
    approx(outcome.slept_ms, 6.0);
    approx(consumer.lag_ms(), 0.0);
}

#[test]
fn lag_only_falls_under_sustained_overload() {
    let (_clock, mut consumer) = reference_consumer();
    let mut previous = consumer.lag_ms();
    for step in 1..=50 {
        let outcome = consumer.process(WorkKind::Heavy);
        assert!(outcome.lag_ms <= previous, "lag rose at step {step}");
        assert!(outcome.lag_ms <= 0.0);
        approx(outcome.slept_ms, 0.0);
        previous = outcome.lag_ms;
    }
    // Unbounded below: 50 overruns of 10ms each.
    approx(consumer.lag_ms(), -500.0);
}

#[test]
fn slow_item_is_caught_up_by_cheap_items() {
    let clock = ManualClock::shared();
    let mut consumer =
        PacedConsumer::new(Duration::ZERO, Duration::from_millis(50), 100, clock.clone()).unwrap();

    consumer.process(WorkKind::Heavy);
    approx(consumer.lag_ms(), -40.0);

    let slept: Vec<f64> = (0..8)
        .map(|_| consumer.process(WorkKind::Small).slept_ms)
        .collect();
    // Four periods pay off the debt, then full periods resume.
    assert_eq!(slept, vec![0.0, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0]);
    approx(consumer.lag_ms(), 0.0);

    // Total time has converged to N * period: no debt left over.
    assert_eq!(clock.now(), Duration::from_millis(9 * 10));
}

#[test]
fn unclassified_raw_label_is_paced_not_fatal() {
    let (clock, mut consumer) = reference_consumer();
    consumer.process(WorkKind::Heavy);
    let outcome = consumer.process_raw(0xff);
    assert_eq!(outcome.kind, None);
    approx(outcome.work_ms, 0.0);
    // 10ms of slack pays the 10ms debt exactly.
    approx(outcome.gained_ms, 0.0);
    approx(consumer.lag_ms(), 0.0);
    assert_eq!(clock.now(), Duration::from_millis(20));

    let known = consumer.process_raw(1);
    assert_eq!(known.kind, Some(WorkKind::Heavy));
}
