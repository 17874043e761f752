//! Runs one pacing scenario and reports per-step frequency.

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pacebench::observer::{
    event_queue, Observer, PaceEvent, TracingObserver, EVENT_QUEUE_CAPACITY,
};
use pacebench::{Pipeline, SimConfig, WaitStrategy};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const REPORT_POLL: Duration = Duration::from_millis(5);

#[derive(Parser, Debug)]
#[command(author, version, about = "Producer/consumer pacing simulator")]
struct Args {
    /// Number of payloads the producer emits
    #[arg(long, default_value_t = 100)]
    payloads: u32,

    /// Producer tick period in milliseconds
    #[arg(long, default_value_t = 10)]
    producer_period_ms: u32,

    /// Every Nth tick produces heavy work
    #[arg(long, default_value_t = 5)]
    heavy_every: u32,

    /// Simulated cost of a small payload in milliseconds
    #[arg(long, default_value_t = 2)]
    small_work_ms: u32,

    /// Simulated cost of a heavy payload in milliseconds
    #[arg(long, default_value_t = 20)]
    heavy_work_ms: u32,

    /// Frequency the consumer tries to hold
    #[arg(long, default_value_t = 100)]
    target_hz: u32,

    /// Busy-poll the queue instead of blocking on it
    #[arg(long)]
    spin: bool,

    /// Print the frequency of every processed step
    #[arg(long)]
    report: bool,
}

impl Args {
    fn config(&self) -> SimConfig {
        SimConfig {
            payload_count: self.payloads,
            producer_period_ms: self.producer_period_ms,
            heavy_every_n: self.heavy_every,
            small_work_ms: self.small_work_ms,
            heavy_work_ms: self.heavy_work_ms,
            target_frequency_hz: self.target_hz,
            wait: if self.spin {
                WaitStrategy::Spin
            } else {
                WaitStrategy::Block
            },
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = args.config();
    let total = config.payload_count;

    let (ring, mut events) = event_queue(EVENT_QUEUE_CAPACITY);
    let consumer_observers: Vec<Box<dyn Observer>> =
        vec![Box::new(TracingObserver), Box::new(ring)];
    let pipeline = Pipeline::new(config)
        .context("invalid scenario")?
        .with_producer_observer(Box::new(TracingObserver))
        .with_consumer_observer(Box::new(consumer_observers));

    let worker = thread::Builder::new()
        .name("driver".into())
        .spawn(move || pipeline.run())
        .context("failed to spawn driver thread")?;

    loop {
        let finished = worker.is_finished();
        for event in events.drain() {
            if let PaceEvent::Processed(outcome) = event {
                if args.report {
                    println!(
                        "Step [{}/{}]: {:.2}Hz",
                        outcome.seq,
                        total,
                        outcome.frequency_hz()
                    );
                }
            }
        }
        if finished {
            break;
        }
        thread::sleep(REPORT_POLL);
    }

    let report = worker
        .join()
        .map_err(|_| anyhow!("driver thread panicked"))?
        .context("pipeline run failed")?;

    let dropped = events.dropped();
    if args.report && dropped > 0 {
        warn!(dropped, "event ring overflowed; some step lines were not printed");
    }

    info!(
        processed = report.processed,
        emitted = report.emitted,
        wall_ms = report.wall.as_millis() as u64,
        mean_hz = report.mean_frequency_hz(),
        peak_debt_ms = report.peak_debt_ms,
        "run complete"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}
