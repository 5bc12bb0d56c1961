//! Wait-group for in-flight background actions.

use std::sync::Arc;

use tokio::sync::watch;

/// Counts background actions currently in flight.
///
/// Endpoints register every background unit of work (an outbound call, an
/// inbound request handler) with the tracker they were built with. The test
/// harness owns the tracker and calls [`ActionTracker::wait_idle`] at
/// teardown so no background task is still touching a channel after the
/// process considers itself done.
///
/// Cloning is cheap; clones observe the same count.
#[derive(Debug, Clone)]
pub struct ActionTracker {
    count: Arc<watch::Sender<usize>>,
}

/// RAII guard for one in-flight action.
///
/// The count is decremented when the guard drops, which also covers panicking
/// tasks unwinding.
#[derive(Debug)]
pub struct ActionGuard {
    count: Arc<watch::Sender<usize>>,
}

impl ActionTracker {
    /// Creates a tracker with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count: Arc::new(count) }
    }

    /// Registers one in-flight action, returning its guard.
    #[must_use]
    pub fn register(&self) -> ActionGuard {
        self.count.send_modify(|count| *count += 1);
        ActionGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Returns the number of actions currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.count.borrow()
    }

    /// Suspends until every registered action has finished.
    pub async fn wait_idle(&self) {
        let mut observer = self.count.subscribe();
        // the tracker itself keeps the sender alive, so this cannot fail
        let _ = observer.wait_for(|count| *count == 0).await;
    }
}

impl Default for ActionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.count.send_modify(|count| *count -= 1);
    }
}
