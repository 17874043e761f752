//! Observation hooks for the producer and the paced consumer.
//!
//! The pipeline threads **report facts**; observers decide what to do with
//! them. Every event is a small `Copy` value, so forwarding one never
//! allocates.
//!
//! - [`NoopObserver`] is the default and does nothing.
//! - [`TracingObserver`] turns events into `tracing` records.
//! - [`RingObserver`] pushes events into a bounded lock-free SPSC ring that a
//!   reporting thread drains with [`EventDrain`]. A full ring drops the event
//!   instead of stalling the paced thread.

use crate::consumer::PaceOutcome;
use crate::work::WorkKind;
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default capacity for the event ring.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Something that happened inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaceEvent {
    /// The producer pushed tick `tick`.
    Produced {
        tick: u32,
        kind: WorkKind,
        /// Labels waiting in the queue after the push.
        backlog: usize,
    },
    /// The consumer finished one item, pacing included.
    Processed(PaceOutcome),
    /// The consumer received a label it could not classify.
    Unclassified { raw: u8 },
    /// The producer loop exited.
    ProducerFinished { emitted: u32, cancelled: bool },
}

/// Receives pipeline events. All methods default to no-ops.
pub trait Observer: Send {
    fn on_event(&mut self, _event: &PaceEvent) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Observer that logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&mut self, event: &PaceEvent) {
        match *event {
            PaceEvent::Produced {
                tick,
                kind,
                backlog,
            } => debug!(tick, %kind, backlog, "producer: created workload"),
            PaceEvent::Processed(outcome) => debug!(
                seq = outcome.seq,
                kind = outcome.kind.map(WorkKind::as_str).unwrap_or("UNCLASSIFIED"),
                work_ms = outcome.work_ms,
                slept_ms = outcome.slept_ms,
                lag_ms = outcome.lag_ms,
                hz = outcome.frequency_hz(),
                "consumer: processed payload"
            ),
            PaceEvent::Unclassified { raw } => {
                warn!(raw, "consumer: work kind not implemented, pacing without work")
            }
            PaceEvent::ProducerFinished { emitted, cancelled } => {
                debug!(emitted, cancelled, "producer: finished")
            }
        }
    }
}

impl Observer for Vec<Box<dyn Observer>> {
    fn on_event(&mut self, event: &PaceEvent) {
        for observer in self.iter_mut() {
            observer.on_event(event);
        }
    }
}

/// Creates a new event ring pair.
///
/// Returns (observer for the paced thread, drain for the reporting thread).
pub fn event_queue(capacity: usize) -> (RingObserver, EventDrain) {
    let (tx, rx) = RingBuffer::new(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        RingObserver {
            tx,
            dropped: dropped.clone(),
        },
        EventDrain { rx, dropped },
    )
}

/// Forwards events into a bounded ring without blocking.
pub struct RingObserver {
    tx: Producer<PaceEvent>,
    dropped: Arc<AtomicU64>,
}

impl RingObserver {
    /// Events discarded because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Observer for RingObserver {
    #[inline]
    fn on_event(&mut self, event: &PaceEvent) {
        // Full ring: drop rather than block the paced thread.
        if self.tx.push(*event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Reading half of the event ring.
pub struct EventDrain {
    rx: Consumer<PaceEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventDrain {
    /// Events the observer half discarded on a full ring. Stays readable
    /// after the observer is gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drains all pending events.
    pub fn drain(&mut self) -> Vec<PaceEvent> {
        let mut events = Vec::with_capacity(self.rx.slots());
        while let Ok(event) = self.rx.pop() {
            events.push(event);
        }
        events
    }

    /// True once the observer half is gone and nothing is left to read.
    pub fn is_finished(&self) -> bool {
        self.rx.is_abandoned() && self.rx.is_empty()
    }
}
