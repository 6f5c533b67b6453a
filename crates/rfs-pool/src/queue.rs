//! Bounded-concurrency slot dispatcher.
//!
//! [`SlotQueue`] holds `size` slots, each identified by a stable index.
//! A task submitted via [`SlotQueue::run`] either takes a free slot
//! immediately or joins a FIFO wait queue; at most `size` tasks execute
//! concurrently at any instant. [`SlotQueue::set_size`] changes the
//! limit live: growth dispatches queued waiters at once, shrinkage
//! retires high slot indices as their current tasks finish and never
//! aborts in-flight work.
//!
//! # Explicit release
//!
//! Some operations hand a long-lived resource (a read stream) back to
//! the caller while the logical task has already returned. Running with
//! [`ReleaseMode::Explicit`] lets the task call [`SlotControl::retain`];
//! the queue then frees the slot only after [`SlotControl::release`]
//! fires, keeping the slot "busy" for idle-timeout purposes until the
//! stream is done.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::sync::{Notify, oneshot};
use tracing::{debug, trace};

/// When the queue considers a slot free again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseMode {
    /// The slot frees as soon as the task future completes.
    #[default]
    OnCompletion,
    /// The task may call [`SlotControl::retain`]; the slot then frees
    /// only after [`SlotControl::release`].
    Explicit,
}

/// Shared retain/release state for one dispatched task.
#[derive(Debug, Default)]
struct ReleaseGate {
    retained: AtomicBool,
    released: AtomicBool,
    notify: Notify,
}

impl ReleaseGate {
    /// Waits until [`SlotControl::release`] has been called.
    async fn released(&self) {
        while !self.released.load(Ordering::Acquire) {
            let notified = self.notify.notified();
            if self.released.load(Ordering::Acquire) {
                break;
            }
            notified.await;
        }
    }
}

/// Handle given to a dispatched task for explicit slot release.
///
/// Cheap to clone; all clones share the same gate. Only meaningful when
/// the task was dispatched with [`ReleaseMode::Explicit`].
#[derive(Debug, Clone, Default)]
pub struct SlotControl {
    gate: Arc<ReleaseGate>,
}

impl SlotControl {
    /// Marks the slot as busy past the task's completion.
    ///
    /// Must be called before the task future returns to take effect.
    pub fn retain(&self) {
        self.gate.retained.store(true, Ordering::Release);
    }

    /// Returns `true` if [`retain`](Self::retain) was called.
    #[must_use]
    pub fn is_retained(&self) -> bool {
        self.gate.retained.load(Ordering::Acquire)
    }

    /// Releases a retained slot.
    ///
    /// Idempotent; safe to call from stream-end and error paths alike.
    pub fn release(&self) {
        self.gate.released.store(true, Ordering::Release);
        self.gate.notify.notify_waiters();
    }

    /// Waits until [`release`](Self::release) has been called.
    ///
    /// Used by the queue and by idle-timer arming, both of which must
    /// defer until a retained stream finishes.
    pub async fn released(&self) {
        self.gate.released().await;
    }
}

/// Internal queue state behind one short-lived mutex.
#[derive(Debug)]
struct QueueState {
    /// Current concurrency limit.
    size: usize,
    /// Slot indices currently free, lowest first.
    free: VecDeque<usize>,
    /// Slot indices currently executing a task.
    active: FxHashSet<usize>,
    /// Tasks waiting for a slot, in submission order.
    waiters: VecDeque<oneshot::Sender<usize>>,
}

impl QueueState {
    /// Hands free slots to queued waiters, preserving FIFO order.
    fn dispatch(&mut self) {
        while !self.waiters.is_empty() {
            let Some(slot) = self.free.pop_front() else {
                break;
            };
            // A waiter whose receiver was dropped is skipped; the slot
            // goes to the next one.
            let mut assigned = false;
            while let Some(tx) = self.waiters.pop_front() {
                if tx.send(slot).is_ok() {
                    self.active.insert(slot);
                    assigned = true;
                    break;
                }
            }
            if !assigned {
                self.free.push_front(slot);
                break;
            }
        }
    }
}

/// A bounded-concurrency dispatcher over fixed slot indices.
///
/// Clone handles share the same queue.
///
/// # Guarantees
///
/// - At most [`size`](Self::size) tasks execute concurrently, before
///   and after any live resize.
/// - Queued tasks are dispatched in submission order when slots are
///   scarce.
/// - A resize never aborts an in-flight task; shrinking only affects
///   future dispatch.
///
/// # Examples
///
/// ```no_run
/// use rfs_pool::{ReleaseMode, SlotQueue};
///
/// # async fn example() {
/// let queue = SlotQueue::new(2);
/// let value = queue
///     .run(ReleaseMode::OnCompletion, |slot, _control| async move {
///         // at most two of these bodies run at once
///         slot
///     })
///     .await;
/// assert!(value < 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SlotQueue {
    state: Arc<Mutex<QueueState>>,
}

impl SlotQueue {
    /// Creates a queue with `size` slots, indices `0..size`.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                size,
                free: (0..size).collect(),
                active: FxHashSet::default(),
                waiters: VecDeque::new(),
            })),
        }
    }

    /// Returns the current concurrency limit.
    #[must_use]
    pub fn size(&self) -> usize {
        self.state.lock().size
    }

    /// Returns the number of tasks currently holding a slot.
    #[must_use]
    pub fn active(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Changes the concurrency limit live.
    ///
    /// Growth makes the new slot indices available immediately and
    /// dispatches queued waiters onto them. Shrinkage retires indices
    /// `>= size` as their tasks complete; nothing in flight is aborted.
    pub fn set_size(&self, size: usize) {
        let mut state = self.state.lock();
        debug!(from = state.size, to = size, "resizing slot queue");
        state.size = size;
        let active = std::mem::take(&mut state.active);
        state.free = (0..size).filter(|i| !active.contains(i)).collect();
        state.active = active;
        state.dispatch();
    }

    /// Runs `task` on the next available slot.
    ///
    /// The returned future resolves with the task's output as soon as
    /// the task completes; with [`ReleaseMode::Explicit`] and a
    /// retained control, the slot itself stays busy until
    /// [`SlotControl::release`] fires.
    pub async fn run<T, F, Fut>(&self, mode: ReleaseMode, task: F) -> T
    where
        F: FnOnce(usize, SlotControl) -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = self.acquire().await;
        trace!(slot, "task dispatched");

        let control = SlotControl::default();
        let result = task(slot, control.clone()).await;

        if matches!(mode, ReleaseMode::Explicit) && control.is_retained() {
            // The logical task continues (e.g. a stream is being
            // consumed); free the slot once it signals release.
            let queue = self.clone();
            tokio::spawn(async move {
                control.released().await;
                trace!(slot, "retained slot released");
                queue.release(slot);
            });
        } else {
            self.release(slot);
        }
        result
    }

    /// Takes a free slot or waits FIFO for one.
    async fn acquire(&self) -> usize {
        loop {
            let rx = {
                let mut state = self.state.lock();
                if let Some(slot) = state.free.pop_front() {
                    state.active.insert(slot);
                    return slot;
                }
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                rx
            };
            match rx.await {
                Ok(slot) => return slot,
                // Sender dropped during a resize edge; queue again.
                Err(_) => continue,
            }
        }
    }

    /// Frees a slot, handing it to the oldest waiter if any.
    fn release(&self, slot: usize) {
        let mut state = self.state.lock();
        state.active.remove(&slot);
        if slot >= state.size {
            trace!(slot, size = state.size, "retiring slot after shrink");
            return;
        }
        state.free.push_back(slot);
        state.dispatch();
    }
}
