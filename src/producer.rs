//! Producer: emits classified payloads at a fixed cadence.

use crate::clock::Clock;
use crate::config::{ConfigError, SimConfig};
use crate::invariant_ppt::{assert_invariant, EMIT_ORDERED};
use crate::observer::{NoopObserver, Observer, PaceEvent};
use crate::queue::WorkSender;
use crate::work::HeavyCadence;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cooperative stop signal for the producer loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Progress {
    target: u32,
    emitted: AtomicU32,
    finished: AtomicBool,
}

/// Read-only view of producer progress, safe to poll from any thread.
///
/// The emitted counter and the finished flag are published with `Release`
/// after the corresponding push, so a reader that observes them with
/// `Acquire` also observes every item pushed up to that point.
#[derive(Debug, Clone)]
pub struct ProducerStatus {
    inner: Arc<Progress>,
}

impl ProducerStatus {
    fn new(target: u32) -> Self {
        Self {
            inner: Arc::new(Progress {
                target,
                emitted: AtomicU32::new(0),
                finished: AtomicBool::new(false),
            }),
        }
    }

    /// True iff every payload has been emitted. Never reverts.
    pub fn is_done(&self) -> bool {
        self.emitted() == self.inner.target
    }

    /// True once the producer loop has exited, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    pub fn emitted(&self) -> u32 {
        self.inner.emitted.load(Ordering::Acquire)
    }

    pub fn target(&self) -> u32 {
        self.inner.target
    }

    fn publish_emitted(&self, emitted: u32) {
        self.inner.emitted.store(emitted, Ordering::Release);
    }

    fn mark_finished(&self) {
        self.inner.finished.store(true, Ordering::Release);
    }
}

/// Publishes `finished` when dropped, so the flag is set even if the loop unwinds.
struct FinishOnDrop(ProducerStatus);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.mark_finished();
    }
}

/// Emits `payload_count` labels, one per `period`. Run it on its own thread.
pub struct Producer {
    period: Duration,
    cadence: HeavyCadence,
    emitted: u32,
    queue: WorkSender,
    status: ProducerStatus,
    cancel: CancelToken,
    clock: Arc<dyn Clock>,
    observer: Box<dyn Observer>,
}

impl Producer {
    /// Create a producer. Fails fast on a zero heavy cadence.
    pub fn new(
        config: &SimConfig,
        queue: WorkSender,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            period: config.producer_period(),
            cadence: config.heavy_cadence()?,
            emitted: 0,
            queue,
            status: ProducerStatus::new(config.payload_count),
            cancel: CancelToken::new(),
            clock,
            observer: Box::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn status(&self) -> ProducerStatus {
        self.status.clone()
    }

    /// Blocking emission loop. Returns the number of payloads pushed.
    ///
    /// The queue closes when this returns, after the status is marked
    /// finished. A panic inside the loop still marks the status finished.
    pub fn run(mut self) -> u32 {
        let finish = FinishOnDrop(self.status.clone());
        let target = self.status.target();
        let mut cancelled = false;
        while self.emitted < target {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.clock.sleep(self.period);
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let tick = self.emitted;
            let kind = self.cadence.classify(tick);
            if let Err(err) = self.queue.push(kind) {
                warn!(tick, %err, "producer: consumer side is gone, stopping");
                break;
            }
            self.emitted += 1;
            assert_invariant(
                EMIT_ORDERED,
                self.emitted == tick + 1,
                "ticks are emitted once, in order",
                None,
            );
            self.status.publish_emitted(self.emitted);
            self.observer.on_event(&PaceEvent::Produced {
                tick,
                kind,
                backlog: self.queue.backlog(),
            });
        }

        drop(finish);
        debug!(emitted = self.emitted, cancelled, "producer loop exited");
        self.observer.on_event(&PaceEvent::ProducerFinished {
            emitted: self.emitted,
            cancelled,
        });
        self.emitted
    }
}
