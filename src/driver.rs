//! Driver loop: moves payloads from the work queue into the paced consumer.

use crate::config::WaitStrategy;
use crate::consumer::{PaceOutcome, PacedConsumer};
use crate::invariant_ppt::{assert_invariant, DONE_MONOTONIC, QUEUE_DRAINED};
use crate::producer::ProducerStatus;
use crate::queue::{QueueError, WorkReceiver};
use crate::work::WorkKind;
use std::hint;

/// Bookkeeping accumulated while draining.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrainTally {
    pub processed: u32,
    pub small: u32,
    pub heavy: u32,
    /// Most negative lag seen after any step.
    pub peak_debt_ms: f64,
    /// Sum of every step, from dequeue to the end of pacing.
    pub busy_ms: f64,
    pub final_lag_ms: f64,
}

impl DrainTally {
    fn record(&mut self, outcome: &PaceOutcome) {
        self.processed += 1;
        match outcome.kind {
            Some(WorkKind::Small) => self.small += 1,
            Some(WorkKind::Heavy) => self.heavy += 1,
            None => {}
        }
        self.peak_debt_ms = self.peak_debt_ms.min(outcome.lag_ms);
        self.busy_ms += outcome.step_ms;
        self.final_lag_ms = outcome.lag_ms;
    }
}

/// Feeds one consumer from one queue until the producer is finished and the
/// queue is empty.
pub struct Driver<'a> {
    consumer: &'a mut PacedConsumer,
    queue: WorkReceiver,
    status: ProducerStatus,
    wait: WaitStrategy,
    tally: DrainTally,
}

impl<'a> Driver<'a> {
    pub fn new(
        consumer: &'a mut PacedConsumer,
        queue: WorkReceiver,
        status: ProducerStatus,
        wait: WaitStrategy,
    ) -> Self {
        Self {
            consumer,
            queue,
            status,
            wait,
            tally: DrainTally::default(),
        }
    }

    /// Run until every emitted payload has been processed exactly once.
    pub fn drain(mut self) -> Result<DrainTally, QueueError> {
        match self.wait {
            WaitStrategy::Spin => self.drain_spinning()?,
            WaitStrategy::Block => self.drain_blocking(),
        }
        assert_invariant(
            QUEUE_DRAINED,
            self.queue.is_empty(),
            "driver exited with payloads still queued",
            None,
        );
        Ok(self.tally)
    }

    fn drain_spinning(&mut self) -> Result<(), QueueError> {
        let mut saw_done = false;
        loop {
            if self.queue.has_payload() {
                let kind = self.queue.take_payload()?;
                self.step(kind);
                continue;
            }

            let done = self.status.is_done();
            assert_invariant(
                DONE_MONOTONIC,
                done || !saw_done,
                "producer reported done and then not done",
                None,
            );
            saw_done = done;

            // The finished flag is published after the final push, so an
            // empty queue observed after it is empty for good.
            if self.status.is_finished() {
                if self.queue.has_payload() {
                    continue;
                }
                return Ok(());
            }
            hint::spin_loop();
        }
    }

    fn drain_blocking(&mut self) {
        while let Some(kind) = self.queue.wait_payload() {
            self.step(kind);
        }
    }

    fn step(&mut self, kind: WorkKind) {
        let outcome = self.consumer.process(kind);
        self.tally.record(&outcome);
    }
}
