use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pacebench::clock::ManualClock;
use pacebench::consumer::PacedConsumer;
use pacebench::queue::work_queue;
use pacebench::work::{HeavyCadence, WorkKind};
use pacebench::{Pipeline, SimConfig};
use std::time::Duration;

fn bench_pacing_step(c: &mut Criterion) {
    let clock = ManualClock::shared();
    let mut consumer =
        PacedConsumer::new(Duration::from_millis(2), Duration::from_millis(20), 100, clock)
            .unwrap();
    let cadence = HeavyCadence::new(5).unwrap();
    let mut tick = 0u32;

    c.bench_function("pace_step_virtual", |b| {
        b.iter(|| {
            let kind = cadence.classify(tick);
            tick = tick.wrapping_add(1);
            black_box(consumer.process(black_box(kind)));
        })
    });
}

fn bench_queue_handoff(c: &mut Criterion) {
    let (tx, mut rx) = work_queue();
    c.bench_function("queue_push_take", |b| {
        b.iter(|| {
            tx.push(black_box(WorkKind::Heavy)).unwrap();
            black_box(rx.take_payload().unwrap());
        })
    });
}

fn bench_virtual_run(c: &mut Criterion) {
    let config = SimConfig {
        payload_count: 1000,
        producer_period_ms: 1,
        ..SimConfig::default()
    };
    c.bench_function("pipeline_1000_virtual", |b| {
        b.iter(|| {
            let report = Pipeline::new(config.clone())
                .unwrap()
                .with_clocks(ManualClock::shared(), ManualClock::shared())
                .run()
                .unwrap();
            black_box(report);
        })
    });
}

criterion_group!(benches, bench_pacing_step, bench_queue_handoff, bench_virtual_run);
criterion_main!(benches);
