//! Work labels and the tick classifier.

use crate::config::ConfigError;
use crate::invariant_ppt::{assert_invariant, CLASSIFY_CADENCE};
use std::fmt;
use std::num::NonZeroU32;
use thiserror::Error;

/// What kind of work a payload simulates.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    /// Cheap payload.
    Small = 0,
    /// Expensive payload.
    Heavy = 1,
}

impl WorkKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkKind::Small => "SMALL",
            WorkKind::Heavy => "HEAVY",
        }
    }
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw label outside the known [`WorkKind`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unclassified work kind {0}")]
pub struct UnclassifiedWorkKind(pub u8);

impl TryFrom<u8> for WorkKind {
    type Error = UnclassifiedWorkKind;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(WorkKind::Small),
            1 => Ok(WorkKind::Heavy),
            other => Err(UnclassifiedWorkKind(other)),
        }
    }
}

impl From<WorkKind> for u8 {
    fn from(kind: WorkKind) -> Self {
        kind as u8
    }
}

/// Validated "every Nth tick is heavy" period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeavyCadence(NonZeroU32);

impl HeavyCadence {
    pub fn new(every_n: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(every_n)
            .map(Self)
            .ok_or(ConfigError::ZeroHeavyCadence)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Classify a tick. Total once the cadence exists.
    pub fn classify(self, tick: u32) -> WorkKind {
        let kind = if tick % self.0.get() == 0 {
            WorkKind::Heavy
        } else {
            WorkKind::Small
        };
        assert_invariant(
            CLASSIFY_CADENCE,
            (kind == WorkKind::Heavy) == (tick % self.0.get() == 0),
            "heavy iff tick is a multiple of the cadence",
            None,
        );
        kind
    }
}

/// Classify tick `tick` against a raw cadence, failing fast on zero.
pub fn classify(tick: u32, every_n: u32) -> Result<WorkKind, ConfigError> {
    Ok(HeavyCadence::new(every_n)?.classify(tick))
}
