//! Paced consumer: simulated work plus lag-accounting cadence control.
//!
//! Each call to [`PacedConsumer::process`] simulates the payload's cost and
//! then tries to stretch the step to exactly one target period. Slack left in
//! the period first pays down earlier debt (`lag`); only what remains is slept
//! off. When the step overruns, the deficit is added to the debt instead of
//! being clamped away, so sustained overload shows up as an ever more negative
//! lag and a later burst of cheap work catches the schedule back up.
//!
//! All arithmetic is in floating-point milliseconds. Lag is unbounded below.

use crate::clock::{as_millis_f64, from_millis_f64, Clock};
use crate::config::{target_period_ms, ConfigError, SimConfig};
use crate::invariant_ppt::{assert_invariant, LAG_NON_POSITIVE, SLEEP_NON_NEGATIVE};
use crate::observer::{NoopObserver, Observer, PaceEvent};
use crate::work::WorkKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// What one `process` call measured and decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceOutcome {
    /// 1-based index of this item within the consumer's lifetime.
    pub seq: u32,
    /// `None` for an unclassified raw label.
    pub kind: Option<WorkKind>,
    /// Measured simulated-work time.
    pub work_ms: f64,
    /// `target_period - work`; negative on overrun.
    pub slack_ms: f64,
    /// `slack + previous lag`.
    pub gained_ms: f64,
    /// Pacing sleep requested; zero while in debt.
    pub slept_ms: f64,
    /// Debt carried into the next call.
    pub lag_ms: f64,
    /// Whole step from dequeue to the end of pacing.
    pub step_ms: f64,
}

impl PaceOutcome {
    /// Instantaneous processing frequency of this step.
    pub fn frequency_hz(&self) -> f64 {
        if self.step_ms > 0.0 {
            1000.0 / self.step_ms
        } else {
            f64::INFINITY
        }
    }
}

/// Consumer that holds a target processing frequency.
pub struct PacedConsumer {
    small_work: Duration,
    heavy_work: Duration,
    target_period_ms: f64,
    lag_ms: f64,
    processed: u32,
    clock: Arc<dyn Clock>,
    observer: Box<dyn Observer>,
}

impl std::fmt::Debug for PacedConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacedConsumer")
            .field("small_work", &self.small_work)
            .field("heavy_work", &self.heavy_work)
            .field("target_period_ms", &self.target_period_ms)
            .field("lag_ms", &self.lag_ms)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}

impl PacedConsumer {
    /// Create a consumer. Fails fast on a zero target frequency.
    pub fn new(
        small_work: Duration,
        heavy_work: Duration,
        target_frequency_hz: u32,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            small_work,
            heavy_work,
            target_period_ms: target_period_ms(target_frequency_hz)?,
            lag_ms: 0.0,
            processed: 0,
            clock,
            observer: Box::new(NoopObserver),
        })
    }

    pub fn from_config(config: &SimConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        Self::new(
            config.small_work(),
            config.heavy_work(),
            config.target_frequency_hz,
            clock,
        )
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Current debt in milliseconds; zero when caught up, negative otherwise.
    pub fn lag_ms(&self) -> f64 {
        self.lag_ms
    }

    pub fn target_period_ms(&self) -> f64 {
        self.target_period_ms
    }

    pub fn processed(&self) -> u32 {
        self.processed
    }

    pub fn work_duration(&self, kind: WorkKind) -> Duration {
        match kind {
            WorkKind::Small => self.small_work,
            WorkKind::Heavy => self.heavy_work,
        }
    }

    /// Simulate `kind` and pace to the target period.
    pub fn process(&mut self, kind: WorkKind) -> PaceOutcome {
        self.pace(Some(kind))
    }

    /// Like [`process`](Self::process) for a raw label.
    ///
    /// Unknown labels are an accepted anomaly: they are logged, simulate no
    /// work, and still go through pacing.
    pub fn process_raw(&mut self, raw: u8) -> PaceOutcome {
        match WorkKind::try_from(raw) {
            Ok(kind) => self.pace(Some(kind)),
            Err(err) => {
                warn!(%err, "consumer received an unclassified payload");
                self.observer.on_event(&PaceEvent::Unclassified { raw });
                self.pace(None)
            }
        }
    }

    fn pace(&mut self, kind: Option<WorkKind>) -> PaceOutcome {
        let start = self.clock.now();
        if let Some(kind) = kind {
            self.clock.sleep(self.work_duration(kind));
        }
        let work_ms = as_millis_f64(self.clock.now().saturating_sub(start));

        let slack_ms = self.target_period_ms - work_ms;
        // lag is never positive, so it only ever shrinks what we may sleep
        let gained_ms = slack_ms + self.lag_ms;
        let slept_ms = if gained_ms > 0.0 {
            self.lag_ms = 0.0;
            self.clock.sleep(from_millis_f64(gained_ms));
            gained_ms
        } else {
            self.lag_ms = gained_ms;
            0.0
        };

        assert_invariant(
            LAG_NON_POSITIVE,
            self.lag_ms <= 0.0,
            "lag must never turn into credit",
            None,
        );
        assert_invariant(
            SLEEP_NON_NEGATIVE,
            slept_ms >= 0.0,
            "pacing sleep must not be negative",
            None,
        );

        self.processed = self.processed.wrapping_add(1);
        let outcome = PaceOutcome {
            seq: self.processed,
            kind,
            work_ms,
            slack_ms,
            gained_ms,
            slept_ms,
            lag_ms: self.lag_ms,
            step_ms: as_millis_f64(self.clock.now().saturating_sub(start)),
        };
        self.observer.on_event(&PaceEvent::Processed(outcome));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn consumer(clock: &Arc<ManualClock>) -> PacedConsumer {
        PacedConsumer::new(
            Duration::from_millis(2),
            Duration::from_millis(20),
            100,
            clock.clone(),
        )
        .unwrap()
    }

    #[test]
    fn small_item_sleeps_off_slack() {
        let clock = ManualClock::shared();
        let mut consumer = consumer(&clock);
        let outcome = consumer.process(WorkKind::Small);
        assert_eq!(outcome.work_ms, 2.0);
        assert_eq!(outcome.slept_ms, 8.0);
        assert_eq!(outcome.lag_ms, 0.0);
        assert_eq!(outcome.step_ms, 10.0);
        assert_eq!(outcome.frequency_hz(), 100.0);
    }

    #[test]
    fn heavy_item_goes_into_debt() {
        let clock = ManualClock::shared();
        let mut consumer = consumer(&clock);
        let outcome = consumer.process(WorkKind::Heavy);
        assert_eq!(outcome.slack_ms, -10.0);
        assert_eq!(outcome.slept_ms, 0.0);
        assert_eq!(consumer.lag_ms(), -10.0);
        // Only the work sleep happened.
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(20)]);
    }

    #[test]
    fn exact_fit_neither_sleeps_nor_owes() {
        let clock = ManualClock::shared();
        let mut consumer =
            PacedConsumer::new(Duration::from_millis(10), Duration::ZERO, 100, clock.clone())
                .unwrap();
        let outcome = consumer.process(WorkKind::Small);
        assert_eq!(outcome.gained_ms, 0.0);
        assert_eq!(outcome.slept_ms, 0.0);
        assert_eq!(consumer.lag_ms(), 0.0);
    }

    #[test]
    fn zero_frequency_rejected() {
        let clock = ManualClock::shared();
        let err = PacedConsumer::new(Duration::ZERO, Duration::ZERO, 0, clock).unwrap_err();
        assert_eq!(err, ConfigError::ZeroTargetFrequency);
    }

    #[test]
    fn unclassified_label_paces_without_work() {
        let clock = ManualClock::shared();
        let mut consumer = consumer(&clock);
        let outcome = consumer.process_raw(42);
        assert_eq!(outcome.kind, None);
        assert_eq!(outcome.work_ms, 0.0);
        assert_eq!(outcome.slept_ms, 10.0);
        assert_eq!(consumer.processed(), 1);
    }

    #[test]
    fn seq_counts_every_item() {
        let clock = ManualClock::shared();
        let mut consumer = consumer(&clock);
        consumer.process(WorkKind::Small);
        consumer.process_raw(1);
        let third = consumer.process(WorkKind::Small);
        assert_eq!(third.seq, 3);
    }
}
