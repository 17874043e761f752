//! Scenario parameters, fixed for the lifetime of a run.

use crate::invariant_ppt::{assert_invariant, CONFIG_VALIDATED};
use crate::work::HeavyCadence;
use std::time::Duration;
use thiserror::Error;

/// How the driver waits when the work queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Busy-poll `has_payload` until work arrives or the producer finishes.
    Spin,
    /// Park on the queue until work arrives or the queue closes.
    #[default]
    Block,
}

/// Errors raised while validating scenario parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `heavy_every_n` was zero; the classifier would divide by zero.
    #[error("heavy_every_n must be non-zero")]
    ZeroHeavyCadence,
    /// `target_frequency_hz` was zero; the target period would be infinite.
    #[error("target_frequency_hz must be non-zero")]
    ZeroTargetFrequency,
}

/// Tunable scenario parameters. Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Total number of payloads the producer emits.
    pub payload_count: u32,
    /// Sleep between two producer ticks.
    pub producer_period_ms: u32,
    /// Every Nth tick (starting with tick 0) is heavy.
    pub heavy_every_n: u32,
    /// Simulated cost of a small payload.
    pub small_work_ms: u32,
    /// Simulated cost of a heavy payload.
    pub heavy_work_ms: u32,
    /// Frequency the consumer tries to hold.
    pub target_frequency_hz: u32,
    /// Driver behaviour on an empty queue.
    pub wait: WaitStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            payload_count: 100,
            producer_period_ms: 10,
            heavy_every_n: 5,
            small_work_ms: 2,
            heavy_work_ms: 20,
            target_frequency_hz: 100,
            wait: WaitStrategy::Block,
        }
    }
}

impl SimConfig {
    /// Check every parameter that would otherwise fail at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heavy_every_n == 0 {
            return Err(ConfigError::ZeroHeavyCadence);
        }
        if self.target_frequency_hz == 0 {
            return Err(ConfigError::ZeroTargetFrequency);
        }
        assert_invariant(CONFIG_VALIDATED, true, "config validated", None);
        Ok(())
    }

    pub fn heavy_cadence(&self) -> Result<HeavyCadence, ConfigError> {
        HeavyCadence::new(self.heavy_every_n)
    }

    /// Ideal time budget per processed item, in milliseconds.
    pub fn target_period_ms(&self) -> Result<f64, ConfigError> {
        target_period_ms(self.target_frequency_hz)
    }

    pub fn producer_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.producer_period_ms))
    }

    pub fn small_work(&self) -> Duration {
        Duration::from_millis(u64::from(self.small_work_ms))
    }

    pub fn heavy_work(&self) -> Duration {
        Duration::from_millis(u64::from(self.heavy_work_ms))
    }

    /// Whether the producer outpaces the consumer's target cadence.
    ///
    /// The simulation only measures pacing when work is always waiting, so a
    /// producer slower than the target period makes the numbers meaningless.
    pub fn producer_outpaces_target(&self) -> bool {
        match self.target_period_ms() {
            Ok(period) => f64::from(self.producer_period_ms) < period,
            Err(_) => false,
        }
    }
}

/// Convert a frequency to a period in milliseconds.
pub fn target_period_ms(frequency_hz: u32) -> Result<f64, ConfigError> {
    if frequency_hz == 0 {
        return Err(ConfigError::ZeroTargetFrequency);
    }
    Ok(1000.0 / f64::from(frequency_hz))
}
