//! Work queue between the producer thread and the driver thread.
//!
//! The queue is an unbounded FIFO with exactly one writer and one reader.
//! Neither half is `Clone`, so the single-writer/single-reader discipline is
//! enforced by ownership rather than by convention.
//!
//! Dropping the [`WorkSender`] closes the queue. Items pushed before the close
//! stay poppable; the reader only observes [`QueueError::Closed`] once the
//! queue is both closed and empty.

use crate::work::WorkKind;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

/// Errors from the reader half of the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `take_payload` was called while `has_payload` was false.
    #[error("take_payload called on an empty work queue")]
    Empty,
    /// The queue is empty and its writer is gone.
    #[error("work queue closed")]
    Closed,
}

/// Creates a new work queue pair.
///
/// Returns (writer for the producer, reader for the driver).
pub fn work_queue() -> (WorkSender, WorkReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (WorkSender { tx }, WorkReceiver { rx })
}

/// Writer half, owned by the producer.
#[derive(Debug)]
pub struct WorkSender {
    tx: Sender<WorkKind>,
}

impl WorkSender {
    /// Push a label. Fails with [`QueueError::Closed`] once the reader is gone.
    pub fn push(&self, kind: WorkKind) -> Result<(), QueueError> {
        self.tx.send(kind).map_err(|_| QueueError::Closed)
    }

    /// Number of labels waiting to be consumed.
    pub fn backlog(&self) -> usize {
        self.tx.len()
    }
}

/// Reader half, owned by the driver.
#[derive(Debug)]
pub struct WorkReceiver {
    rx: Receiver<WorkKind>,
}

impl WorkReceiver {
    /// True iff at least one label is waiting.
    pub fn has_payload(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Pop the oldest label.
    ///
    /// Only valid after `has_payload` returned true; an empty queue is a
    /// protocol violation reported as [`QueueError::Empty`].
    pub fn take_payload(&mut self) -> Result<WorkKind, QueueError> {
        self.rx.try_recv().map_err(|err| match err {
            TryRecvError::Empty => QueueError::Empty,
            TryRecvError::Disconnected => QueueError::Closed,
        })
    }

    /// Block until a label arrives. `None` once the queue is closed and drained.
    pub fn wait_payload(&mut self) -> Option<WorkKind> {
        self.rx.recv().ok()
    }
}
