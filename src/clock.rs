//! Time source seam for the producer and the paced consumer.
//!
//! [`SystemClock`] runs against the monotonic wall clock. [`ManualClock`] keeps
//! virtual time: every `sleep` advances it by exactly the requested amount, so
//! pacing scenarios become deterministic and fast to test.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source that can also block.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by [`Instant`] and [`thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Sleeps a [`ManualClock`] remembers by default.
pub const SLEEP_LOG_CAPACITY: usize = 4096;

/// Virtual clock. `sleep` returns immediately after advancing time.
///
/// Only the most recent sleeps are kept, so long virtual runs stay bounded.
#[derive(Debug)]
pub struct ManualClock {
    now_ns: AtomicU64,
    sleep_count: AtomicU64,
    log_capacity: usize,
    sleeps: Mutex<VecDeque<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::with_log_capacity(SLEEP_LOG_CAPACITY)
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` sleeps in the log. Zero disables it.
    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            now_ns: AtomicU64::new(0),
            sleep_count: AtomicU64::new(0),
            log_capacity: capacity,
            sleeps: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.now_ns
            .fetch_add(saturating_nanos(duration), Ordering::AcqRel);
    }

    /// The retained sleeps, oldest first.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().iter().copied().collect()
    }

    /// Sleeps requested since creation, including ones evicted from the log.
    pub fn sleep_count(&self) -> u64 {
        self.sleep_count.load(Ordering::Acquire)
    }

    pub fn clear_sleeps(&self) {
        self.sleeps.lock().clear();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.now_ns.load(Ordering::Acquire))
    }

    fn sleep(&self, duration: Duration) {
        self.sleep_count.fetch_add(1, Ordering::AcqRel);
        if self.log_capacity > 0 {
            let mut log = self.sleeps.lock();
            if log.len() == self.log_capacity {
                log.pop_front();
            }
            log.push_back(duration);
        }
        self.advance(duration);
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Duration as floating-point milliseconds.
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Floating-point milliseconds as a duration, clamped at zero.
pub fn from_millis_f64(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}
