//! Bounded work queues with drop-on-full backpressure.
//!
//! Each queue is a single-producer (the poller) / single-consumer (a worker)
//! channel of fixed capacity. Offering never blocks: when the queue is full
//! the new item is dropped and a warning is logged. Nothing is retried here;
//! the next poll re-offers anything that is still pending upstream, so the
//! poll cadence is never held back by a backlog of slow executions.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// The result of offering an item to a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The item was queued.
    Queued,
    /// The queue was full; the item was dropped.
    Dropped,
    /// The consumer has gone away; the item was dropped.
    Closed,
}

/// Creates a bounded queue named `name` (used in log events).
///
/// A capacity of zero is raised to one.
pub fn work_queue<T>(name: &'static str, capacity: usize) -> (WorkSender<T>, WorkReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (WorkSender { name, tx }, WorkReceiver { rx })
}

/// The producing side of a work queue.
#[derive(Debug)]
pub struct WorkSender<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
}

impl<T> WorkSender<T> {
    /// Offers `item` without waiting.
    pub fn offer(&self, item: T) -> Offer {
        match self.tx.try_send(item) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(_)) => {
                warn!(queue = self.name, "too busy; dropping pending item");
                Offer::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                warn!(queue = self.name, "worker stopped; dropping pending item");
                Offer::Closed
            }
        }
    }

    /// The queue name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The consuming side of a work queue.
#[derive(Debug)]
pub struct WorkReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> WorkReceiver<T> {
    /// Waits for the next item. Returns `None` once every sender is gone and
    /// the queue is empty.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Takes the next item if one is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
