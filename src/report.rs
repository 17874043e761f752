//! Run summary and post-run checks.

use crate::driver::DrainTally;
use std::time::Duration;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Payloads the producer pushed.
    pub emitted: u32,
    /// Payloads the consumer processed.
    pub processed: u32,
    pub small: u32,
    pub heavy: u32,
    pub final_lag_ms: f64,
    pub peak_debt_ms: f64,
    /// Consumer time spent in `process`, pacing sleeps included.
    pub busy_ms: f64,
    /// Wall time of the whole run on the consumer's clock.
    pub wall: Duration,
    /// The producer was stopped before emitting every payload.
    pub cancelled: bool,
}

pub type CheckResult = Result<(), String>;

impl RunReport {
    pub(crate) fn new(emitted: u32, tally: DrainTally, wall: Duration, cancelled: bool) -> Self {
        Self {
            emitted,
            processed: tally.processed,
            small: tally.small,
            heavy: tally.heavy,
            final_lag_ms: tally.final_lag_ms,
            peak_debt_ms: tally.peak_debt_ms,
            busy_ms: tally.busy_ms,
            wall,
            cancelled,
        }
    }

    /// Average processing frequency over the consumer's busy time.
    pub fn mean_frequency_hz(&self) -> f64 {
        if self.busy_ms > 0.0 {
            f64::from(self.processed) * 1000.0 / self.busy_ms
        } else {
            0.0
        }
    }

    /// Every emitted payload was processed exactly once, and `expected` were emitted.
    pub fn verify_conservation(&self, expected: u32) -> CheckResult {
        if self.emitted != expected {
            return Err(format!(
                "producer emitted {} payloads (expected {})",
                self.emitted, expected
            ));
        }
        if self.processed != self.emitted {
            return Err(format!(
                "consumer processed {} payloads (emitted {})",
                self.processed, self.emitted
            ));
        }
        if self.small + self.heavy != self.processed {
            return Err(format!(
                "kind counts {} + {} do not add up to {} processed",
                self.small, self.heavy, self.processed
            ));
        }
        Ok(())
    }

    /// The consumer never ran ahead of its cadence.
    ///
    /// Each step lasts at least `target + lag_before - lag_after`, so summed
    /// over a run the busy time is at least `processed * target - final_lag`.
    pub fn verify_pacing(&self, target_period_ms: f64) -> CheckResult {
        // Allow a nanosecond of rounding per step.
        let tolerance = f64::from(self.processed) * 1e-6;
        let floor = f64::from(self.processed) * target_period_ms - self.final_lag_ms;
        if self.busy_ms + tolerance < floor {
            return Err(format!(
                "busy time {:.3}ms is below the pacing floor {:.3}ms",
                self.busy_ms, floor
            ));
        }
        if self.final_lag_ms > 0.0 || self.peak_debt_ms > 0.0 {
            return Err(format!(
                "lag turned positive (final {:.3}ms, peak {:.3}ms)",
                self.final_lag_ms, self.peak_debt_ms
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(emitted: u32, processed: u32) -> RunReport {
        RunReport {
            emitted,
            processed,
            small: processed.saturating_sub(1),
            heavy: processed.min(1),
            final_lag_ms: 0.0,
            peak_debt_ms: -4.0,
            busy_ms: f64::from(processed) * 10.0,
            wall: Duration::from_millis(u64::from(processed) * 10),
            cancelled: false,
        }
    }

    #[test]
    fn conservation_checks() {
        assert!(report(10, 10).verify_conservation(10).is_ok());
        assert!(report(10, 9).verify_conservation(10).is_err());
        assert!(report(9, 9).verify_conservation(10).is_err());
    }

    #[test]
    fn pacing_checks() {
        let ok = report(10, 10);
        assert!(ok.verify_pacing(10.0).is_ok());
        assert_eq!(ok.mean_frequency_hz(), 100.0);

        let too_fast = RunReport {
            busy_ms: 50.0,
            ..ok
        };
        assert!(too_fast.verify_pacing(10.0).is_err());
    }
}
