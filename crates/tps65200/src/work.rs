//! Deferred work queue.
//!
//! Interrupt entry points and the timer wheel never touch the bus. They post a
//! [`Work`] marker here and the worker ([`crate::Tps65200::run_pending`])
//! performs the register I/O later.

use heapless::Deque;

use crate::error::{Error, Result};
use crate::sync::IrqMutex;

/// Queue capacity. Each work kind is queued at most once, so this is never
/// reached in practice.
pub const QUEUE_DEPTH: usize = 8;

/// A unit of deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Work {
    /// Status-change line fired: reset the charger.
    ClearStatus,
    /// Debounce or poll timer for the fault line expired.
    FaultRecheck,
    /// Periodic watchdog check is due.
    WatchdogCheck,
}

/// Bounded FIFO of pending work, safe to post to from interrupt context.
pub struct WorkQueue {
    queue: IrqMutex<Deque<Work, QUEUE_DEPTH>>,
}

impl WorkQueue {
    pub const fn new() -> Self {
        Self {
            queue: IrqMutex::new(Deque::new()),
        }
    }

    /// Queues `work` unless an instance is already pending.
    ///
    /// Returns `Ok(false)` when the work was already pending.
    pub fn queue(&self, work: Work) -> Result<bool> {
        self.queue.with(|queue| {
            if queue.iter().any(|&pending| pending == work) {
                return Ok(false);
            }
            queue.push_back(work).map_err(|_| Error::QueueFull)?;
            Ok(true)
        })
    }

    pub fn pop(&self) -> Option<Work> {
        self.queue.with(|queue| queue.pop_front())
    }

    /// Drops a pending instance of `work`. Cancelling nothing is not an error.
    pub fn cancel(&self, work: Work) -> bool {
        self.queue.with(|queue| {
            let mut kept = Deque::<Work, QUEUE_DEPTH>::new();
            let mut removed = false;
            while let Some(pending) = queue.pop_front() {
                if pending == work {
                    removed = true;
                } else {
                    // Same capacity as the source, cannot overflow
                    let _ = kept.push_back(pending);
                }
            }
            *queue = kept;
            removed
        })
    }

    pub fn is_pending(&self, work: Work) -> bool {
        self.queue.with(|queue| queue.iter().any(|&pending| pending == work))
    }

    pub fn len(&self) -> usize {
        self.queue.with(|queue| queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
