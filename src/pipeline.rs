//! Pipeline: one producer thread, one driver/consumer thread, one scenario.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, SimConfig};
use crate::consumer::PacedConsumer;
use crate::driver::Driver;
use crate::invariant_ppt::{assert_invariant, CONSERVATION};
use crate::observer::{NoopObserver, Observer};
use crate::producer::{CancelToken, Producer};
use crate::queue::{work_queue, QueueError};
use crate::report::RunReport;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{info, warn};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("driver protocol violation: {0}")]
    Queue(#[from] QueueError),

    #[error("failed to spawn producer thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("producer thread panicked")]
    ProducerPanicked,

    #[error("payload conservation violated: emitted {emitted}, processed {processed}")]
    Conservation { emitted: u32, processed: u32 },
}

/// A configured, not yet started scenario.
pub struct Pipeline {
    config: SimConfig,
    producer_clock: Arc<dyn Clock>,
    consumer_clock: Arc<dyn Clock>,
    producer_observer: Box<dyn Observer>,
    consumer_observer: Box<dyn Observer>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Validate `config` and prepare a run on the system clock.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = SystemClock::shared();
        Ok(Self {
            config,
            producer_clock: clock.clone(),
            consumer_clock: clock,
            producer_observer: Box::new(NoopObserver),
            consumer_observer: Box::new(NoopObserver),
            cancel: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Use one clock for both threads.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        self.with_clocks(clock.clone(), clock)
    }

    pub fn with_clocks(mut self, producer: Arc<dyn Clock>, consumer: Arc<dyn Clock>) -> Self {
        self.producer_clock = producer;
        self.consumer_clock = consumer;
        self
    }

    pub fn with_producer_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.producer_observer = observer;
        self
    }

    pub fn with_consumer_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.consumer_observer = observer;
        self
    }

    /// Token that stops the producer early when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the scenario to completion on the calling thread.
    pub fn run(self) -> PipelineResult<RunReport> {
        let Pipeline {
            config,
            producer_clock,
            consumer_clock,
            producer_observer,
            consumer_observer,
            cancel,
        } = self;

        if !config.producer_outpaces_target() {
            warn!(
                producer_period_ms = config.producer_period_ms,
                target_frequency_hz = config.target_frequency_hz,
                "producer is not faster than the target period; measured pacing will be starved"
            );
        }

        let (tx, rx) = work_queue();
        let producer = Producer::new(&config, tx, producer_clock)?
            .with_observer(producer_observer)
            .with_cancel(cancel);
        let status = producer.status();
        let mut consumer = PacedConsumer::from_config(&config, consumer_clock.clone())?
            .with_observer(consumer_observer);

        info!(
            payloads = config.payload_count,
            target_hz = config.target_frequency_hz,
            wait = ?config.wait,
            "starting pipeline"
        );
        let started = consumer_clock.now();
        let handle = thread::Builder::new()
            .name("producer".into())
            .spawn(move || producer.run())?;

        let drained = Driver::new(&mut consumer, rx, status.clone(), config.wait).drain();
        // Join before propagating so the producer never outlives the run.
        let joined = handle.join();
        let tally = drained?;
        let emitted = joined.map_err(|_| PipelineError::ProducerPanicked)?;
        let wall = consumer_clock.now().saturating_sub(started);

        if tally.processed != emitted {
            return Err(PipelineError::Conservation {
                emitted,
                processed: tally.processed,
            });
        }
        assert_invariant(
            CONSERVATION,
            true,
            "every emitted payload is processed exactly once",
            None,
        );

        let report = RunReport::new(emitted, tally, wall, !status.is_done());
        info!(
            processed = report.processed,
            heavy = report.heavy,
            final_lag_ms = report.final_lag_ms,
            peak_debt_ms = report.peak_debt_ms,
            mean_hz = report.mean_frequency_hz(),
            "pipeline finished"
        );
        Ok(report)
    }
}
