//! Producer/consumer pacing simulator.
//!
//! A producer thread emits classified payloads at a fixed cadence; a driver
//! thread drains them into a [`PacedConsumer`](consumer::PacedConsumer) that
//! holds a target processing frequency by sleeping off slack and carrying
//! overruns forward as lag.

pub mod clock;
pub mod config;
pub mod consumer;
pub mod driver;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod observer;
pub mod pipeline;
pub mod producer;
pub mod queue;
pub mod report;
pub mod work;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SimConfig, WaitStrategy};
pub use consumer::{PaceOutcome, PacedConsumer};
pub use pipeline::{Pipeline, PipelineError, PipelineResult};
pub use producer::{CancelToken, Producer, ProducerStatus};
pub use queue::{work_queue, QueueError, WorkReceiver, WorkSender};
pub use report::RunReport;
pub use work::{classify, HeavyCadence, WorkKind};
