//! Dispatch of fires raised while another fire is in progress.

use crate::core::Args;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// How a fire raised from inside a running transition is handled.
///
/// ```rust
/// use statehouse::FiringMode;
///
/// let mode: FiringMode = serde_json::from_str("\"immediate\"").unwrap();
/// assert_eq!(mode, FiringMode::Immediate);
/// assert_eq!(FiringMode::default(), FiringMode::Queued);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiringMode {
    /// Run the nested fire to completion before the outer transition
    /// continues, interleaving their callbacks.
    Immediate,
    /// Append the nested fire to a FIFO drained after the current fire
    /// completes.
    #[default]
    Queued,
}

pub struct QueuedTrigger<T> {
    pub trigger: T,
    pub args: Args,
}

/// Firing flag and FIFO of pending triggers.
pub struct Scheduler<T> {
    mode: FiringMode,
    firing: AtomicBool,
    queue: Mutex<VecDeque<QueuedTrigger<T>>>,
}

impl<T> Scheduler<T> {
    /// Idle scheduler with an empty queue.
    pub fn new(mode: FiringMode) -> Self {
        Self {
            mode,
            firing: AtomicBool::new(false),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn mode(&self) -> FiringMode {
        self.mode
    }

    #[cfg(test)]
    fn is_firing(&self) -> bool {
        self.firing.load(Ordering::Acquire)
    }

    /// Claim the firing flag; `None` when a fire is already in progress.
    pub fn try_begin(&self) -> Option<FiringGuard<'_, T>> {
        self.firing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FiringGuard { scheduler: self })
    }

    /// Append a trigger raised while a fire is in progress.
    pub fn enqueue(&self, trigger: T, args: Args) {
        self.queue.lock().push_back(QueuedTrigger { trigger, args });
    }

    /// Next queued trigger, oldest first.
    pub fn dequeue(&self) -> Option<QueuedTrigger<T>> {
        self.queue.lock().pop_front()
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Holds the firing flag; releasing it discards anything still queued.
pub struct FiringGuard<'a, T> {
    scheduler: &'a Scheduler<T>,
}

impl<T> Drop for FiringGuard<'_, T> {
    fn drop(&mut self) {
        let discarded: Vec<_> = self.scheduler.queue.lock().drain(..).collect();
        if !discarded.is_empty() {
            warn!(count = discarded.len(), "discarding queued triggers");
        }
        self.scheduler.firing.store(false, Ordering::Release);
    }
}
