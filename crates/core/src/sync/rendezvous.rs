//! Zero-capacity handoff with bounded waiting.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{self, Instant};

/// Errors produced by [`Rendezvous`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The counterpart did not show up within the allowed duration.
    #[error("rendezvous timed out after {0:?}")]
    Timeout(Duration),
    /// The channel was torn down while an operation was in progress.
    #[error("rendezvous channel closed")]
    Closed,
}

/// A rendezvous point between exactly one producer and one consumer at a time.
///
/// The handoff has no buffer: `send_timeout` completes only once a live
/// `recv_timeout` caller has taken the value. A producer arriving when nobody
/// is waiting parks until a receiver shows up or its own deadline passes, and
/// the value is never left behind in a slot no one is waiting on.
///
/// Receivers register a one-shot slot and wait on it; producers claim slots
/// in arrival order, skipping slots whose receiver has already given up.
/// Both sides may be called from any number of tasks.
#[derive(Debug)]
pub struct Rendezvous<T> {
    slots_tx: mpsc::UnboundedSender<oneshot::Sender<T>>,
    slots_rx: Mutex<mpsc::UnboundedReceiver<oneshot::Sender<T>>>,
}

impl<T: Send> Rendezvous<T> {
    /// Creates a new rendezvous point.
    #[must_use]
    pub fn new() -> Self {
        let (slots_tx, slots_rx) = mpsc::unbounded_channel();
        Self {
            slots_tx,
            slots_rx: Mutex::new(slots_rx),
        }
    }

    /// Waits up to `timeout` for a producer to hand over a value.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Timeout`] when no producer arrived in time.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<T, SyncError> {
        let (slot, taken) = oneshot::channel();
        self.slots_tx.send(slot).map_err(|_| SyncError::Closed)?;

        match time::timeout(timeout, taken).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(SyncError::Closed),
            Err(_) => Err(SyncError::Timeout(timeout)),
        }
    }

    /// Waits up to `timeout` for a consumer, then hands `value` over.
    ///
    /// Slots left behind by receivers that already timed out are skipped; the
    /// value is returned to this producer and offered to the next slot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Timeout`] when no live consumer arrived in time;
    /// the value is dropped in that case.
    pub async fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), SyncError> {
        let deadline = Instant::now() + timeout;
        let mut value = value;

        let Ok(mut slots) = time::timeout_at(deadline, self.slots_rx.lock()).await else {
            return Err(SyncError::Timeout(timeout));
        };

        loop {
            let slot = match time::timeout_at(deadline, slots.recv()).await {
                Ok(Some(slot)) => slot,
                Ok(None) => return Err(SyncError::Closed),
                Err(_) => return Err(SyncError::Timeout(timeout)),
            };

            match slot.send(value) {
                Ok(()) => return Ok(()),
                // receiver gave up while queued; try the next one
                Err(rejected) => value = rejected,
            }
        }
    }
}

impl<T: Send> Default for Rendezvous<T> {
    fn default() -> Self {
        Self::new()
    }
}
