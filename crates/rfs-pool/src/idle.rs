//! Per-slot idle-disconnect timers.
//!
//! After every capability call the generic client arms a timer for the
//! slot it used; if the slot stays unused until the timer fires, the
//! backend connection is disconnected. The next call on that slot
//! cancels the pending timer first, so an actively used connection is
//! never torn down. Timers are a soft reclaim: they never interrupt an
//! in-flight call, because a dispatched call cancels the timer before
//! touching the connection.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

/// One cancellable disconnect timer per slot.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use rfs_pool::IdleTimers;
///
/// # async fn example() {
/// let timers = IdleTimers::new(Duration::from_secs(300));
///
/// // after an operation on slot 0:
/// timers.arm(0, || async {
///     // disconnect slot 0
/// });
///
/// // next operation on slot 0 reuses the live connection:
/// timers.cancel(0);
/// # }
/// ```
#[derive(Debug)]
pub struct IdleTimers {
    /// Pending timer tasks, indexed by slot; grows on demand.
    pending: Mutex<Vec<Option<JoinHandle<()>>>>,
    /// Idle window before a slot's connection is reclaimed.
    delay: Mutex<Duration>,
}

impl IdleTimers {
    /// Creates an empty timer table with the given idle window.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            delay: Mutex::new(delay),
        }
    }

    /// Returns the current idle window.
    #[must_use]
    pub fn delay(&self) -> Duration {
        *self.delay.lock()
    }

    /// Changes the idle window for timers armed from now on.
    ///
    /// Already-armed timers keep the delay they were armed with.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Cancels the pending timer for `slot`, if any.
    ///
    /// Called at the start of every dispatched operation so a reused
    /// connection is never reclaimed underneath it.
    pub fn cancel(&self, slot: usize) {
        let handle = self.pending.lock().get_mut(slot).and_then(Option::take);
        if let Some(handle) = handle {
            trace!(slot, "cancelling idle-disconnect timer");
            handle.abort();
        }
    }

    /// Arms the disconnect timer for `slot`, replacing any pending one.
    ///
    /// `on_idle` runs only if the slot stays unused for the whole idle
    /// window.
    pub fn arm<F, Fut>(&self, slot: usize, on_idle: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let delay = self.delay();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(slot, "idle window elapsed, disconnecting");
            on_idle().await;
        });

        let mut pending = self.pending.lock();
        if pending.len() <= slot {
            pending.resize_with(slot + 1, || None);
        }
        if let Some(previous) = pending[slot].replace(handle) {
            previous.abort();
        }
    }

    /// Cancels every pending timer.
    ///
    /// Used on explicit client disconnect/teardown.
    pub fn cancel_all(&self) {
        let handles: Vec<_> = self
            .pending
            .lock()
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        for handle in handles {
            handle.abort();
        }
    }
}

impl Drop for IdleTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let timers = IdleTimers::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&fired);
        timers.arm(0, move || async move {
            count.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let timers = IdleTimers::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&fired);
        timers.arm(0, move || async move {
            count.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(50)).await;
        timers.cancel(0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_timer() {
        let timers = IdleTimers::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&fired);
            timers.arm(2, move || async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
            sleep(Duration::from_millis(50)).await;
        }

        sleep(Duration::from_millis(150)).await;
        // Only the last armed timer fires.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let timers = IdleTimers::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        for slot in 0..4 {
            let count = Arc::clone(&fired);
            timers.arm(slot, move || async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        timers.cancel_all();

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_unknown_slot_is_noop() {
        let timers = IdleTimers::new(Duration::from_millis(100));
        timers.cancel(7);
    }
}
